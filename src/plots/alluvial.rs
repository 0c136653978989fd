//! Alluvial rendering of a [`FlowDiagram`]
//!
//! Node heights and ribbon widths are proportional to record counts, so the
//! ribbons leaving a node exactly cover its height.

use plotters::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use super::{PlotError, Result};
use crate::analysis::flow::{FlowDiagram, FlowStage};

const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 20.0;
const MARGIN_X: f64 = 110.0;
const NODE_WIDTH: f64 = 18.0;
const NODE_GAP: f64 = 14.0;
const RIBBON_STEPS: usize = 24;

/// A node's rectangle in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub stage: usize,
    pub label: String,
    pub count: usize,
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

/// A link's vertical band at its source and at its target
#[derive(Debug, Clone, PartialEq)]
pub struct Ribbon {
    pub color_key: String,
    pub x0: f64,
    pub x1: f64,
    pub source: (f64, f64),
    pub target: (f64, f64),
}

impl Ribbon {
    /// Closed outline: the top edge left to right, then the bottom edge back
    pub fn outline(&self) -> Vec<(i32, i32)> {
        let curve = |t: f64, from: f64, to: f64| {
            let s = t * t * (3.0 - 2.0 * t);
            from + (to - from) * s
        };
        let steps: Vec<f64> = (0..=RIBBON_STEPS)
            .map(|i| i as f64 / RIBBON_STEPS as f64)
            .collect();
        let x = |t: f64| self.x0 + (self.x1 - self.x0) * t;

        let top = steps
            .iter()
            .map(|&t| (x(t), curve(t, self.source.0, self.target.0)));
        let bottom = steps
            .iter()
            .rev()
            .map(|&t| (x(t), curve(t, self.source.1, self.target.1)));
        top.chain(bottom)
            .map(|(x, y)| (x.round() as i32, y.round() as i32))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowLayout {
    pub nodes: Vec<NodeBox>,
    pub ribbons: Vec<Ribbon>,
    pub stage_x: Vec<f64>,
}

/// Positions nodes and ribbons for a `width` x `height` canvas
pub fn layout(diagram: &FlowDiagram, width: u32, height: u32) -> FlowLayout {
    let stage_count = diagram.stages.len();
    if stage_count == 0 || diagram.total == 0 {
        return FlowLayout::default();
    }

    let span = (width as f64 - 2.0 * MARGIN_X - NODE_WIDTH).max(0.0);
    let stage_x: Vec<f64> = (0..stage_count)
        .map(|i| {
            if stage_count == 1 {
                MARGIN_X
            } else {
                MARGIN_X + span * i as f64 / (stage_count - 1) as f64
            }
        })
        .collect();

    let max_nodes = diagram.stages.iter().map(|s| s.nodes.len()).max().unwrap_or(1);
    let available = (height as f64
        - MARGIN_TOP
        - MARGIN_BOTTOM
        - NODE_GAP * max_nodes.saturating_sub(1) as f64)
        .max(0.0);
    let scale = available / diagram.total as f64;

    let mut nodes = Vec::new();
    for (stage, stage_nodes) in diagram.stages.iter().enumerate() {
        let mut y = MARGIN_TOP;
        for node in &stage_nodes.nodes {
            let y1 = y + node.count as f64 * scale;
            nodes.push(NodeBox {
                stage,
                label: node.label.clone(),
                count: node.count,
                x: stage_x[stage],
                y0: y,
                y1,
            });
            y = y1 + NODE_GAP;
        }
    }

    let top_of = |stage: usize, label: &str| {
        nodes
            .iter()
            .find(|n| n.stage == stage && n.label == label)
            .map(|n| n.y0)
    };

    let mut outgoing: HashMap<(usize, &str), f64> = HashMap::new();
    let mut incoming: HashMap<(usize, &str), f64> = HashMap::new();
    let mut ribbons = Vec::new();
    for link in &diagram.links {
        let to_stage = link.from_stage + 1;
        let (Some(src_top), Some(dst_top)) =
            (top_of(link.from_stage, &link.from), top_of(to_stage, &link.to))
        else {
            continue;
        };
        let thickness = link.count as f64 * scale;

        let out = outgoing.entry((link.from_stage, link.from.as_str())).or_insert(0.0);
        let source = (src_top + *out, src_top + *out + thickness);
        *out += thickness;

        let inc = incoming.entry((to_stage, link.to.as_str())).or_insert(0.0);
        let target = (dst_top + *inc, dst_top + *inc + thickness);
        *inc += thickness;

        ribbons.push(Ribbon {
            color_key: link.from.clone(),
            x0: stage_x[link.from_stage] + NODE_WIDTH,
            x1: stage_x[to_stage],
            source,
            target,
        });
    }

    FlowLayout {
        nodes,
        ribbons,
        stage_x,
    }
}

fn node_color(label: &str) -> PaletteColor<Palette99> {
    let index = FlowStage::FinalStatus
        .vocabulary()
        .iter()
        .position(|l| *l == label)
        .unwrap_or(0);
    Palette99::pick(index)
}

/// Draws the diagram with stage titles above each column and
/// "label (n)" beside each node
pub fn draw_flow(diagram: &FlowDiagram, path: &Path, width: u32, height: u32) -> Result<()> {
    if diagram.total == 0 {
        return Err(PlotError::InvalidData("flow diagram has no records".to_string()));
    }
    let geometry = layout(diagram, width, height);

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    root.draw(&Text::new(
        "Code Status Flow".to_string(),
        (MARGIN_X as i32, 12),
        ("sans-serif", 22).into_font(),
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (stage, x) in diagram.stages.iter().zip(&geometry.stage_x) {
        root.draw(&Text::new(
            stage.title.clone(),
            (*x as i32 - 30, (MARGIN_TOP - 24.0) as i32),
            ("sans-serif", 14).into_font(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    for ribbon in &geometry.ribbons {
        root.draw(&Polygon::new(
            ribbon.outline(),
            node_color(&ribbon.color_key).mix(0.35).filled(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    let last_stage = geometry.stage_x.len().saturating_sub(1);
    for node in &geometry.nodes {
        root.draw(&Rectangle::new(
            [
                (node.x as i32, node.y0 as i32),
                ((node.x + NODE_WIDTH) as i32, node.y1.max(node.y0 + 1.0) as i32),
            ],
            node_color(&node.label).filled(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let text = format!("{} ({})", node.label, node.count);
        let text_x = if node.stage == last_stage {
            node.x + NODE_WIDTH + 6.0
        } else {
            node.x - 100.0
        };
        root.draw(&Text::new(
            text,
            (text_x as i32, ((node.y0 + node.y1) / 2.0) as i32 - 6),
            ("sans-serif", 12).into_font(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}
