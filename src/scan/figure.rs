//! Plot-ready scan output.
//!
//! Figure construction itself happens elsewhere; these types carry the series
//! and axis metadata a figure builder needs.

use serde::{Deserialize, Serialize};

/// One named series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    /// Series identifier (pattern or coefficient name)
    pub name: String,
    /// Legend label
    pub label: String,
    /// Scanned parameter values
    pub x_data: Vec<f64>,
    /// Series values, one per scan point
    pub y_data: Vec<f64>,
    /// Category tags for legend grouping
    pub categories: Vec<String>,
}

/// Horizontal axis scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Log,
    Linear,
}

/// Axis labels, scale and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisProperties {
    pub x_label: String,
    pub y_label: String,
    pub x_scale: AxisScale,
    /// `(min, max)` of the scanned values
    pub x_limits: (f64, f64),
}

/// Series plus axis and legend metadata of one parameter scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFigure {
    /// Scanned parameter
    pub parameter: String,
    /// Scanned control coefficient
    pub coefficient: String,
    /// One series per control pattern, then (value scans) the coefficient
    pub lines: Vec<LineData>,
    pub axes: AxisProperties,
    /// Legend category -> series names
    pub category_classes: Vec<(String, Vec<String>)>,
}

impl ScanFigure {
    /// Scanned parameter values
    pub fn x_data(&self) -> &[f64] {
        self.lines
            .first()
            .map(|line| line.x_data.as_slice())
            .unwrap_or(&[])
    }

    /// Series by name
    pub fn line(&self, name: &str) -> Option<&LineData> {
        self.lines.iter().find(|line| line.name == name)
    }

    /// Series names in column order
    pub fn names(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.name.as_str()).collect()
    }

    /// Column layout: x values first, then one column per series
    pub fn columns(&self) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(self.lines.len() + 1);
        columns.push(self.x_data().to_vec());
        columns.extend(self.lines.iter().map(|line| line.y_data.clone()));
        columns
    }

    /// Row layout: one row per scan point, x value first
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.x_data()
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                std::iter::once(x)
                    .chain(self.lines.iter().map(|line| line.y_data[i]))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure() -> ScanFigure {
        let x = vec![1.0, 10.0];
        ScanFigure {
            parameter: "X0".into(),
            coefficient: "ccJ".into(),
            lines: vec![
                LineData {
                    name: "CP1".into(),
                    label: "CP1".into(),
                    x_data: x.clone(),
                    y_data: vec![0.1, 0.2],
                    categories: vec!["CP1".into()],
                },
                LineData {
                    name: "CP2".into(),
                    label: "CP2".into(),
                    x_data: x,
                    y_data: vec![0.3, 0.4],
                    categories: vec!["CP2".into()],
                },
            ],
            axes: AxisProperties {
                x_label: "[X0]".into(),
                y_label: "Percentage Contribution".into(),
                x_scale: AxisScale::Log,
                x_limits: (1.0, 10.0),
            },
            category_classes: vec![("Control Patterns".into(), vec!["CP1".into(), "CP2".into()])],
        }
    }

    #[test]
    fn test_columns_x_first() {
        let columns = figure().columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0], vec![1.0, 10.0]);
        assert_eq!(columns[2], vec![0.3, 0.4]);
    }

    #[test]
    fn test_rows() {
        let rows = figure().rows();
        assert_eq!(rows, vec![vec![1.0, 0.1, 0.3], vec![10.0, 0.2, 0.4]]);
    }

    #[test]
    fn test_serialization() {
        let fig = figure();
        let json = serde_json::to_string(&fig).unwrap();
        assert!(json.contains("\"x_scale\":\"log\""));
        let parsed: ScanFigure = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fig);
    }
}
