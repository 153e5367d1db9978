//! Correlation matrix heatmap.

use super::{FONT, Figure, GRID, render_svg};
use crate::utils::format_float;
use anyhow::{Result, bail};
use plotters::prelude::*;

pub const FILE_NAME: &str = "correlation_heatmap.svg";

const LABEL_SPACE: i32 = 140;
const TITLE_SPACE: i32 = 60;

/// Diverging colour for a coefficient in `[-1, 1]`: blue for negative,
/// white at zero, red for positive. Undefined coefficients are grey.
pub fn cell_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        return GRID;
    }
    let r = r.clamp(-1.0, 1.0);
    let fade = |full: u8, t: f64| (255.0 - (255.0 - full as f64) * t).round() as u8;
    if r >= 0.0 {
        RGBColor(fade(214, r), fade(39, r), fade(40, r))
    } else {
        RGBColor(fade(31, -r), fade(119, -r), fade(180, -r))
    }
}

/// Render a square matrix of coefficients with one row/column per name.
pub fn render(names: &[String], matrix: &[Vec<f64>]) -> Result<Figure> {
    let n = names.len();
    if n == 0 {
        bail!("correlation heatmap needs at least one column");
    }
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        bail!("correlation matrix is not {}x{}", n, n);
    }

    let cell = (560 / n as i32).clamp(12, 90);
    let grid = cell * n as i32;
    let width = (LABEL_SPACE + grid + 40) as u32;
    let height = (TITLE_SPACE + LABEL_SPACE + grid) as u32;
    let show_values = cell >= 36;

    let title = "Pearson correlation".to_string();
    let svg = render_svg((width, height), |root| {
        root.draw(&Text::new(
            title.as_str(),
            (LABEL_SPACE, 20),
            (FONT, 22).into_font(),
        ))?;

        let label_font = (FONT, 13).into_font();
        let value_font = (FONT, 12).into_font();

        for (i, row) in matrix.iter().enumerate() {
            let y = TITLE_SPACE + i as i32 * cell;
            root.draw(&Text::new(
                names[i].as_str(),
                (8, y + cell / 2 - 6),
                label_font.clone(),
            ))?;

            for (j, r) in row.iter().enumerate() {
                let x = LABEL_SPACE + j as i32 * cell;
                root.draw(&Rectangle::new(
                    [(x, y), (x + cell, y + cell)],
                    cell_color(*r).filled(),
                ))?;
                root.draw(&Rectangle::new([(x, y), (x + cell, y + cell)], WHITE))?;
                if show_values {
                    let label: String = format_float(r.is_finite().then_some(*r))
                        .chars()
                        .take(5)
                        .collect();
                    root.draw(&Text::new(
                        label,
                        (x + 4, y + cell / 2 - 6),
                        value_font.clone(),
                    ))?;
                }
            }
        }

        let bottom = TITLE_SPACE + grid + 8;
        for (j, name) in names.iter().enumerate() {
            let x = LABEL_SPACE + j as i32 * cell + cell / 2;
            root.draw(&Text::new(
                name.as_str(),
                (x, bottom),
                label_font.clone().transform(FontTransform::Rotate90),
            ))?;
        }
        Ok(())
    })?;

    Ok(Figure {
        file_name: FILE_NAME.to_string(),
        title,
        svg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_color_scale() {
        assert_eq!(cell_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(cell_color(1.0), RGBColor(214, 39, 40));
        assert_eq!(cell_color(-1.0), RGBColor(31, 119, 180));
        assert_eq!(cell_color(f64::NAN), GRID);
        assert_eq!(cell_color(3.0), cell_color(1.0));
    }

    #[test]
    fn test_render_matrix() {
        let names = vec!["age".to_string(), "income".to_string()];
        let matrix = vec![vec![1.0, 0.5], vec![0.5, 1.0]];
        let figure = render(&names, &matrix).unwrap();
        assert_eq!(figure.file_name, FILE_NAME);
        assert!(figure.svg.contains("income"));
    }

    #[test]
    fn test_render_with_undefined_coefficient() {
        let names = vec!["a".to_string(), "b".to_string()];
        let matrix = vec![vec![1.0, f64::NAN], vec![f64::NAN, f64::NAN]];
        assert!(render(&names, &matrix).is_ok());
    }

    #[test]
    fn test_render_rejects_bad_shapes() {
        assert!(render(&[], &[]).is_err());
        let names = vec!["a".to_string()];
        assert!(render(&names, &[vec![1.0, 2.0]]).is_err());
    }
}
