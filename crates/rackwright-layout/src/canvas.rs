//! Per-rack 2D canvas projection.
//!
//! Every rack is drawn on its own canvas: a name band on top, then the rack frame. Rack-unit
//! coordinates grow upward from the rack base while canvas Y grows downward, so all vertical
//! positions go through [`rack_unit_y_to_canvas_y`].

use crate::cores::assign_core_owners;
use crate::{Error, Result};
use crate::factor::{FactorPadding, best_factor};
use crate::model::{CoreCell, LabelOrientation, LayoutRect, NodeCanvas, NodeLabel, RackCanvas};
use crate::text::{TextMeasurer, TextStyle};
use rackwright_core::geom::{CanvasRect, canvas_rect};
use rackwright_core::{
    AllocatedCpus, CanvasConfig, ColorScheme, Diagnostics, LayoutConfig, NodeColors, Rack,
    RackNode, RackSet, SlurmNodes,
};

/// Canvas Y of the top edge of a node sitting at rack unit `posy` and spanning `height_units`.
pub fn rack_unit_y_to_canvas_y(
    frame_top: f64,
    config: &CanvasConfig,
    posy: f64,
    height_units: f64,
) -> f64 {
    frame_top + config.rack_height()
        - config.rack_border_width
        - posy * config.rack_unit_height
        - height_units * config.rack_unit_height
}

/// Outer rack outline on its canvas.
pub fn rack_frame(config: &CanvasConfig) -> CanvasRect {
    canvas_rect(
        config.rack_margin_left,
        config.rack_margin_top + config.rack_name_height,
        config.rack_width(),
        config.rack_height(),
    )
}

pub fn node_rect(frame: &CanvasRect, config: &CanvasConfig, node: &RackNode) -> CanvasRect {
    canvas_rect(
        frame.origin.x + config.rack_border_width + node.posx * config.rack_inside_width,
        rack_unit_y_to_canvas_y(frame.origin.y, config, node.posy, node.height),
        node.width * config.rack_inside_width,
        node.height * config.rack_unit_height,
    )
}

/// Area of a node left for cores once padding and the LED column are taken out.
fn core_area(rect: &CanvasRect, config: &CanvasConfig) -> CanvasRect {
    canvas_rect(
        rect.origin.x + config.node_padding + config.led_size + config.led_margin,
        rect.origin.y + config.node_padding,
        rect.size.width - config.core_padding_horizontal(),
        rect.size.height - config.core_padding_vertical(),
    )
}

fn led_rect(rect: &CanvasRect, config: &CanvasConfig) -> CanvasRect {
    let size = config
        .led_size
        .min(rect.size.height - 2.0 * config.node_padding)
        .max(0.0);
    canvas_rect(
        rect.origin.x + config.node_padding,
        rect.center().y - size / 2.0,
        size,
        size,
    )
}

/// Shortens `text` until it fits `max_width`: at least one trailing character is dropped and at
/// least one is kept, then the ellipsis is appended. Returns the text and whether it was cut.
pub fn truncate_label(
    text: &str,
    max_width: f64,
    ellipsis: &str,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> (String, bool) {
    if measurer.measure(text, style).width <= max_width {
        return (text.to_string(), false);
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return (text.to_string(), false);
    }
    let mut keep = chars.len() - 1;
    loop {
        let mut candidate: String = chars[..keep].iter().collect();
        candidate.push_str(ellipsis);
        if keep == 1 || measurer.measure(&candidate, style).width <= max_width {
            return (candidate, true);
        }
        keep -= 1;
    }
}

pub fn place_label(
    name: &str,
    rect: &CanvasRect,
    config: &CanvasConfig,
    measurer: &dyn TextMeasurer,
) -> NodeLabel {
    let orientation = if rect.size.width >= rect.size.height {
        LabelOrientation::Horizontal
    } else {
        LabelOrientation::Vertical
    };
    let along = match orientation {
        LabelOrientation::Horizontal => rect.size.width,
        LabelOrientation::Vertical => rect.size.height,
    };
    let max_width = (along - 2.0 * config.text_padding).max(config.min_label_width);
    let style = TextStyle::with_size(config.font_size);
    let (text, truncated) = truncate_label(name, max_width, &config.ellipsis, &style, measurer);
    let center = rect.center();
    NodeLabel {
        text,
        x: center.x,
        y: center.y,
        orientation,
        max_width,
        truncated,
        hover: truncated.then(|| (*rect).into()),
    }
}

fn unknown_colors(colors: &ColorScheme) -> NodeColors {
    NodeColors {
        occupancy: colors.occupancy.unknown,
        led: colors.led.unknown,
    }
}

#[allow(clippy::too_many_arguments)]
fn project_node(
    node: &RackNode,
    frame: &CanvasRect,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    diag: &mut Diagnostics,
) -> NodeCanvas {
    let canvas = &config.canvas;
    let rect = node_rect(frame, canvas, node);
    let slurm = slurm_nodes.and_then(|nodes| nodes.get(&node.name));
    let colors = match slurm {
        Some(s) => config.colors.resolve_node_colors(s),
        None => unknown_colors(&config.colors),
    };

    let mut grid = None;
    let mut cores = Vec::new();
    if let Some(s) = slurm {
        let padding = FactorPadding {
            horizontal: canvas.core_padding_horizontal(),
            vertical: canvas.core_padding_vertical(),
        };
        grid = best_factor(rect.size.width, rect.size.height, s.cpus, padding);
        let area = core_area(&rect, canvas);
        if let Some(g) = grid.filter(|_| area.size.width > 0.0 && area.size.height > 0.0) {
            let node_allocs = allocations.get(&node.name).map_or(&[][..], Vec::as_slice);
            let owners = assign_core_owners(&node.name, s.cpus, node_allocs, diag);
            let cell_w = area.size.width / f64::from(g.cols);
            let cell_h = area.size.height / f64::from(g.rows);
            let inset = canvas.core_padding.min(cell_w / 2.0).min(cell_h / 2.0);
            cores.reserve(owners.len());
            for (index, owner) in (0u32..).zip(owners) {
                let (col, row) = g.cell(index);
                let x = area.max_x() - f64::from(col + 1) * cell_w;
                let y = area.max_y() - f64::from(row + 1) * cell_h;
                cores.push(CoreCell {
                    index,
                    rect: LayoutRect {
                        x: x + inset,
                        y: y + inset,
                        width: cell_w - 2.0 * inset,
                        height: cell_h - 2.0 * inset,
                    },
                    color: owner.map_or(config.colors.idle_core, |job| {
                        config.colors.job_color(job)
                    }),
                    job_id: owner,
                });
            }
        }
    }

    NodeCanvas {
        name: node.name.clone(),
        rect: rect.into(),
        colors,
        led: led_rect(&rect, canvas).into(),
        label: place_label(&node.name, &rect, canvas, measurer),
        grid,
        cores,
    }
}

pub fn project_rack(
    rack: &Rack,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    diag: &mut Diagnostics,
) -> RackCanvas {
    let canvas = &config.canvas;
    let frame = rack_frame(canvas);
    let body = frame.inflate(-canvas.rack_border_width, -canvas.rack_border_width);
    let (width, height) = canvas.canvas_size();

    let nodes = rack
        .nodes
        .iter()
        .map(|node| {
            project_node(
                node,
                &frame,
                slurm_nodes,
                allocations,
                config,
                measurer,
                diag,
            )
        })
        .collect::<Vec<_>>();

    tracing::debug!(rack = %rack.name, nodes = nodes.len(), "rack canvas projected");

    RackCanvas {
        name: rack.name.clone(),
        width,
        height,
        frame: frame.into(),
        body: body.into(),
        border_color: config.colors.rack_border,
        body_color: config.colors.rack_body,
        name_x: frame.center().x,
        name_y: canvas.rack_margin_top + canvas.rack_name_height / 2.0,
        nodes,
    }
}

/// One independent canvas per rack, in range order.
pub fn project_racks(
    racks: &RackSet,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    diag: &mut Diagnostics,
) -> Vec<RackCanvas> {
    racks
        .racks()
        .map(|rack| project_rack(rack, slurm_nodes, allocations, config, measurer, diag))
        .collect()
}

/// Projects the rack called `name`, wherever it sits in the room.
pub fn project_named_rack(
    racks: &RackSet,
    name: &str,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    diag: &mut Diagnostics,
) -> Result<RackCanvas> {
    let rack = racks.rack(name).ok_or_else(|| Error::UnknownRack {
        name: name.to_string(),
    })?;
    Ok(project_rack(
        rack,
        slurm_nodes,
        allocations,
        config,
        measurer,
        diag,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_zero_sits_on_the_bottom_border() {
        let config = CanvasConfig::default();
        let frame_top = 30.0;
        let y = rack_unit_y_to_canvas_y(frame_top, &config, 0.0, 1.0);
        assert_eq!(y, frame_top + config.rack_height() - config.rack_border_width - 12.0);
    }

    #[test]
    fn higher_units_move_up_the_canvas() {
        let config = CanvasConfig::default();
        let low = rack_unit_y_to_canvas_y(0.0, &config, 1.0, 1.0);
        let high = rack_unit_y_to_canvas_y(0.0, &config, 10.0, 1.0);
        assert!(high < low);
        assert_eq!(low - high, 9.0 * config.rack_unit_height);
    }

    #[test]
    fn top_unit_touches_the_top_border() {
        let config = CanvasConfig::default();
        let y = rack_unit_y_to_canvas_y(0.0, &config, config.rack_units - 1.0, 1.0);
        assert!((y - config.rack_border_width).abs() < 1e-9);
    }
}
