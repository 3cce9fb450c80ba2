//! Cumulative per-category stack offsets for stacked-bar renderers.

use serde::Serialize;

use super::disagg::{ContributionGrid, GridCell};
use crate::color::{ColorMap, LegendEntry, Palette, PaletteKind, Rgb};
use crate::data::model::CellValue;

/// One category's layer: per-cell base and height, parallel to the
/// layout's cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackLayer {
    pub category: CellValue,
    pub color_index: usize,
    pub color: Option<Rgb>,
    pub base: Vec<f64>,
    pub height: Vec<f64>,
}

/// One bar segment, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackRecord {
    pub abscissa: f64,
    pub ordinate: f64,
    pub height: f64,
    pub base: f64,
    pub category: CellValue,
    pub color_index: usize,
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackLayout {
    pub cells: Vec<GridCell>,
    /// Draw order, bottom layer first.
    pub layers: Vec<StackLayer>,
    pub legend: Vec<LegendEntry>,
}

impl StackLayout {
    /// Flatten to one record per (cell, category), layer by layer.
    pub fn records(&self) -> Vec<StackRecord> {
        self.layers
            .iter()
            .flat_map(|layer| {
                self.cells.iter().enumerate().map(move |(i, cell)| StackRecord {
                    abscissa: cell.abscissa,
                    ordinate: cell.ordinate,
                    height: layer.height[i],
                    base: layer.base[i],
                    category: layer.category.clone(),
                    color_index: layer.color_index,
                    color: layer.color,
                })
            })
            .collect()
    }
}

/// Builds stack layouts; the palette is chosen per call from the number of
/// categories in the grid.
#[derive(Debug, Clone, Copy)]
pub struct StackedLayoutBuilder {
    palette: PaletteKind,
}

impl StackedLayoutBuilder {
    pub fn new(palette: PaletteKind) -> Self {
        Self { palette }
    }

    pub fn build(&self, grid: &ContributionGrid) -> StackLayout {
        let palette = Palette::for_categories(self.palette, grid.categories.len());
        let colors = ColorMap::new(&grid.categories, &palette);

        let mut base = vec![0.0; grid.cells.len()];
        let layers = colors
            .legend_entries()
            .iter()
            .enumerate()
            .map(|(k, entry)| {
                let height = grid.category_column(k);
                let layer = StackLayer {
                    category: entry.category.clone(),
                    color_index: entry.color_index,
                    color: entry.color,
                    base: base.clone(),
                    height,
                };
                for (b, h) in base.iter_mut().zip(&layer.height) {
                    *b += h;
                }
                layer
            })
            .collect();

        StackLayout {
            cells: grid.cells.clone(),
            layers,
            legend: colors.legend_entries().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::disagg::{reduce, DisaggregationRecord};

    fn record(magnitude: f64, distance: f64, epsilon: f64, weight: f64) -> DisaggregationRecord {
        DisaggregationRecord {
            magnitude,
            distance,
            epsilon: CellValue::Float(epsilon),
            tectonic_region: None,
            poe: 0.002,
            imt: "SA(1.0)".into(),
            weight,
        }
    }

    fn sample_grid() -> ContributionGrid {
        reduce(&[
            record(5.5, 10.0, 0.5, 0.3),
            record(5.5, 10.0, -0.5, 0.7),
            record(6.5, 30.0, 1.5, 0.11),
            record(6.5, 30.0, 0.5, 0.13),
            record(7.5, 90.0, -0.5, 0.17),
            record(7.5, 90.0, 1.5, 0.19),
        ])
        .unwrap()
        .grid
    }

    #[test]
    fn bases_accumulate_lower_layers() {
        let grid = sample_grid();
        let layout = StackedLayoutBuilder::new(PaletteKind::Spectrum).build(&grid);
        assert_eq!(layout.layers.len(), 3);
        for i in 0..layout.cells.len() {
            assert_eq!(layout.layers[0].base[i], 0.0);
            for k in 1..layout.layers.len() {
                let below = &layout.layers[k - 1];
                assert_eq!(layout.layers[k].base[i], below.base[i] + below.height[i]);
            }
            let heights: f64 = layout.layers.iter().map(|l| l.height[i]).sum();
            assert!((heights - grid.cell_total(i)).abs() < 1e-15);
        }
    }

    #[test]
    fn layers_follow_first_seen_order() {
        let layout = StackedLayoutBuilder::new(PaletteKind::Spectrum).build(&sample_grid());
        let order: Vec<CellValue> = layout.layers.iter().map(|l| l.category.clone()).collect();
        assert_eq!(
            order,
            vec![
                CellValue::Float(0.5),
                CellValue::Float(-0.5),
                CellValue::Float(1.5)
            ]
        );
        let indices: Vec<usize> = layout.layers.iter().map(|l| l.color_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn single_epsilon_stack_equals_marginal() {
        let reduced = reduce(&[
            record(5.5, 10.0, 0.0, 2.0),
            record(6.5, 30.0, 0.0, 1.0),
            record(5.5, 10.0, 0.0, 1.0),
        ])
        .unwrap();
        let layout = StackedLayoutBuilder::new(PaletteKind::Spectrum).build(&reduced.grid);
        assert_eq!(layout.layers.len(), 1);
        let marginal: Vec<f64> = reduced.marginal.iter().map(|c| c.contribution).collect();
        assert_eq!(layout.layers[0].height, marginal);
        assert!(layout.layers[0].base.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn records_are_one_per_cell_and_category() {
        let grid = sample_grid();
        let layout = StackedLayoutBuilder::new(PaletteKind::Tableau).build(&grid);
        let records = layout.records();
        assert_eq!(records.len(), grid.cells.len() * grid.categories.len());
        // distance is the abscissa, magnitude the ordinate
        assert_eq!((records[0].abscissa, records[0].ordinate), (10.0, 5.5));
        // missing (cell, category) combinations are zero-height segments
        let empty = records
            .iter()
            .find(|r| r.ordinate == 5.5 && r.category == CellValue::Float(1.5))
            .unwrap();
        assert_eq!(empty.height, 0.0);
    }

    #[test]
    fn tableau_colors_cycle() {
        let grid = ContributionGrid::pivot((0..8).map(|i| {
            (
                GridCell {
                    abscissa: 10.0,
                    ordinate: 6.0,
                },
                CellValue::Integer(i),
                0.125,
            )
        }));
        let layout = StackedLayoutBuilder::new(PaletteKind::Tableau).build(&grid);
        assert_eq!(layout.layers[6].color_index, 0);
        assert_eq!(layout.layers[6].color, layout.layers[0].color);
        assert!((layout.layers[7].base[0] - 0.875).abs() < 1e-15);
    }
}
