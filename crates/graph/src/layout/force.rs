//! Force-directed layout simulation
//!
//! Forces per tick: link springs, many-body repulsion, pairwise
//! collision on node radius, then a centering shift. Both pair loops are
//! O(n²), which is fine for the few hundred nodes of a bookmark graph.

use super::{Position, Positions};
use crate::citation::{Graph, LinkKind};
use citenet_common::config::GraphConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
const CHARGE_STRENGTH: f64 = -220.0;
const COLLIDE_PADDING: f64 = 6.0;
const INITIAL_RADIUS: f64 = 10.0;

/// Deterministic force layout
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub width: f64,
    pub height: f64,
    pub iterations: usize,

    /// Seed of the jiggle RNG used to separate coincident nodes
    pub seed: u64,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            iterations: 260,
            seed: 0x5eed,
        }
    }
}

impl From<&GraphConfig> for ForceLayout {
    fn from(config: &GraphConfig) -> Self {
        Self {
            width: config.layout_width,
            height: config.layout_height,
            iterations: config.layout_iterations,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    radius: f64,
}

struct Spring {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    bias: f64,
}

impl ForceLayout {
    /// Lay out `graph`; the same graph always yields the same positions
    pub fn compute(&self, graph: &Graph) -> Positions {
        let n = graph.nodes.len();
        if n == 0 {
            return Positions::new();
        }

        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        let mut bodies: Vec<Body> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let r = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * golden;
                Body {
                    x: cx + r * angle.cos(),
                    y: cy + r * angle.sin(),
                    radius: node.size as f64 + COLLIDE_PADDING,
                    ..Body::default()
                }
            })
            .collect();

        let springs = self.springs(graph);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut jiggle = move || (rng.gen::<f64>() - 0.5) * 1e-6;

        let alpha_decay = 1.0 - ALPHA_MIN.powf(1.0 / self.iterations.max(1) as f64);
        let mut alpha = 1.0;

        for _ in 0..self.iterations {
            alpha += (0.0 - alpha) * alpha_decay;

            apply_springs(&mut bodies, &springs, alpha, &mut jiggle);
            apply_charge(&mut bodies, alpha, &mut jiggle);
            apply_collision(&mut bodies, &mut jiggle);

            for body in &mut bodies {
                body.vx *= 1.0 - VELOCITY_DECAY;
                body.vy *= 1.0 - VELOCITY_DECAY;
                body.x += body.vx;
                body.y += body.vy;
            }

            // Centering
            let (sx, sy) = bodies
                .iter()
                .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
            let (dx, dy) = (sx / n as f64 - cx, sy / n as f64 - cy);
            for body in &mut bodies {
                body.x -= dx;
                body.y -= dy;
            }
        }

        graph
            .nodes
            .iter()
            .zip(bodies)
            .map(|(node, body)| (node.id.clone(), Position { x: body.x, y: body.y }))
            .collect()
    }

    fn springs(&self, graph: &Graph) -> Vec<Spring> {
        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut degree = vec![0usize; graph.nodes.len()];
        let pairs: Vec<(usize, usize, LinkKind)> = graph
            .links
            .iter()
            .filter_map(|l| {
                let s = *index.get(l.source.as_str())?;
                let t = *index.get(l.target.as_str())?;
                (s != t).then_some((s, t, l.kind))
            })
            .collect();
        for &(s, t, _) in &pairs {
            degree[s] += 1;
            degree[t] += 1;
        }

        pairs
            .into_iter()
            .map(|(source, target, kind)| {
                let (distance, strength) = match kind {
                    LinkKind::Cocite | LinkKind::Shared => (160.0, 0.12),
                    LinkKind::Direct => (90.0, 0.25),
                };
                Spring {
                    source,
                    target,
                    distance,
                    strength,
                    bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
                }
            })
            .collect()
    }
}

fn apply_springs(bodies: &mut [Body], springs: &[Spring], alpha: f64, jiggle: &mut impl FnMut() -> f64) {
    for spring in springs {
        let (s, t) = (bodies[spring.source], bodies[spring.target]);
        let mut dx = t.x + t.vx - s.x - s.vx;
        let mut dy = t.y + t.vy - s.y - s.vy;
        if dx == 0.0 {
            dx = jiggle();
        }
        if dy == 0.0 {
            dy = jiggle();
        }

        let len = (dx * dx + dy * dy).sqrt();
        let k = (len - spring.distance) / len * alpha * spring.strength;
        let (fx, fy) = (dx * k, dy * k);

        bodies[spring.target].vx -= fx * spring.bias;
        bodies[spring.target].vy -= fy * spring.bias;
        bodies[spring.source].vx += fx * (1.0 - spring.bias);
        bodies[spring.source].vy += fy * (1.0 - spring.bias);
    }
}

fn apply_charge(bodies: &mut [Body], alpha: f64, jiggle: &mut impl FnMut() -> f64) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let mut dx = bodies[j].x - bodies[i].x;
            let mut dy = bodies[j].y - bodies[i].y;
            if dx == 0.0 {
                dx = jiggle();
            }
            if dy == 0.0 {
                dy = jiggle();
            }

            let l2 = (dx * dx + dy * dy).max(1.0);
            let w = CHARGE_STRENGTH * alpha / l2;

            bodies[i].vx += dx * w;
            bodies[i].vy += dy * w;
            bodies[j].vx -= dx * w;
            bodies[j].vy -= dy * w;
        }
    }
}

fn apply_collision(bodies: &mut [Body], jiggle: &mut impl FnMut() -> f64) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (bodies[i], bodies[j]);
            let r = a.radius + b.radius;

            let mut dx = (a.x + a.vx) - (b.x + b.vx);
            let mut dy = (a.y + a.vy) - (b.y + b.vy);
            let mut l2 = dx * dx + dy * dy;
            if l2 >= r * r {
                continue;
            }
            if dx == 0.0 {
                dx = jiggle();
                l2 += dx * dx;
            }
            if dy == 0.0 {
                dy = jiggle();
                l2 += dy * dy;
            }

            let len = l2.sqrt();
            let k = (r - len) / len;
            let (fx, fy) = (dx * k, dy * k);

            // Heavier (larger) bodies move less
            let (ra2, rb2) = (a.radius * a.radius, b.radius * b.radius);
            let share_a = rb2 / (ra2 + rb2);

            bodies[i].vx += fx * share_a;
            bodies[i].vy += fy * share_a;
            bodies[j].vx -= fx * (1.0 - share_a);
            bodies[j].vy -= fy * (1.0 - share_a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{GraphLink, GraphNode};

    fn star(leaves: usize) -> Graph {
        let mut nodes = vec![GraphNode::new("hub", "hub")];
        let mut links = Vec::new();
        for i in 0..leaves {
            let id = format!("leaf{}", i);
            nodes.push(GraphNode::new(id.clone(), id.clone()));
            links.push(GraphLink::direct("hub", id));
        }
        Graph { nodes, links }
    }

    fn distance(a: &Position, b: &Position) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_empty_graph() {
        assert!(ForceLayout::default().compute(&Graph::default()).is_empty());
    }

    #[test]
    fn test_deterministic_and_finite() {
        let graph = star(12);
        let layout = ForceLayout::default();

        let first = layout.compute(&graph);
        let second = layout.compute(&graph);
        assert_eq!(first, second);
        assert_eq!(first.len(), 13);
        assert!(first.values().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_centered_on_canvas() {
        let layout = ForceLayout::default();
        let positions = layout.compute(&star(8));

        let n = positions.len() as f64;
        let mean_x = positions.values().map(|p| p.x).sum::<f64>() / n;
        let mean_y = positions.values().map(|p| p.y).sum::<f64>() / n;
        assert!((mean_x - layout.width / 2.0).abs() < 1e-6);
        assert!((mean_y - layout.height / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_nodes_are_separated() {
        let graph = star(6);
        let positions = ForceLayout::default().compute(&graph);

        let ids: Vec<&String> = positions.keys().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert!(distance(&positions[*a], &positions[*b]) > 5.0);
            }
        }
    }
}
