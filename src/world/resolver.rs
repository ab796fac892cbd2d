//! Narrow-phase contact resolution.
//!
//! Each category (walls, body pairs, circle obstacles, rectangle obstacles)
//! is resolved in two passes. The first works from a read-only view of the
//! bodies, possibly in parallel. The second writes to the bodies in contact
//! order, so the result does not depend on how the first pass was scheduled.
//!
//! Body pairs compute their full deltas in the first pass and the second
//! pass sums them. Obstacle contacts only detect in the first pass; the
//! second pass responds to each against the body's current state, so a body
//! resting on two abutting obstacles bounces once, not twice.

use rayon::prelude::*;

use crate::collision::detection::{check_circle_boundary, check_circle_circle, check_circle_rect, DISTANCE_EPSILON};
use crate::collision::{Aabb, BoundarySide, Contact, ContactKind, PairSet, Penetration};
use crate::math::vec2::Vec2;
use crate::objects::{Body, Obstacle};
use crate::shapes::Shape;
use crate::world::SolverConfig;

/// Change to apply to one body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BodyDelta {
    velocity: Vec2,
    position: Vec2,
}

impl BodyDelta {
    fn apply(&self, body: &mut Body) {
        body.velocity += self.velocity;
        body.position += self.position;
    }
}

/// A detected body-obstacle overlap, waiting to be responded to.
struct ObstacleHit {
    contact: Contact,
    pen: Penetration,
    /// Body position when the overlap was measured.
    origin: Vec2,
    friction: f64,
}

/// Outcome of one body pair: the contact record and the deltas it produces.
struct Resolution {
    contact: Contact,
    first: (usize, BodyDelta),
    second: Option<(usize, BodyDelta)>,
}

/// Resolves overlaps into post-collision velocities and positions.
/// Obstacles and world bounds are only read.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    pub config: SolverConfig,
}

impl Resolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Resolves every category in turn: walls, body pairs, circle obstacles,
    /// rectangle obstacles. Returns the contacts found, in that order.
    pub fn resolve(&self, bodies: &mut [Body], obstacles: &[Obstacle], bounds: &Aabb<2>, pairs: &PairSet) -> Vec<Contact> {
        let mut contacts = self.resolve_boundaries(bodies, bounds);
        contacts.extend(self.resolve_body_pairs(bodies, &pairs.body_body));
        contacts.extend(self.resolve_obstacle_pairs(bodies, obstacles, &pairs.body_circle));
        contacts.extend(self.resolve_obstacle_pairs(bodies, obstacles, &pairs.body_rect));
        contacts
    }

    /// Keeps bodies inside `bounds`. Walls act like immovable obstacles made
    /// of the body's own material.
    pub fn resolve_boundaries(&self, bodies: &mut [Body], bounds: &Aabb<2>) -> Vec<Contact> {
        let resolve_one = |(index, body): (usize, &mut Body)| {
            let mut contacts = Vec::new();
            // Sides are handled one after the other so corners see the
            // first wall's correction
            for side in BoundarySide::ALL {
                let Some(pen) = check_circle_boundary(body.position, body.radius, bounds, side) else {
                    continue;
                };
                let (resolved, mut delta) = self.solve_against_static(body, pen, body.material.friction);
                // Stay inside even when already moving away from the wall
                delta.position = pen.normal * self.correction(pen.depth);
                delta.apply(body);
                contacts.push(Contact {
                    body: index,
                    kind: ContactKind::Boundary(side),
                    normal: pen.normal,
                    depth: pen.depth,
                    resolved,
                });
            }
            contacts
        };

        if self.config.parallel {
            bodies.par_iter_mut().enumerate().flat_map_iter(resolve_one).collect()
        } else {
            bodies.iter_mut().enumerate().flat_map(resolve_one).collect()
        }
    }

    /// Resolves body-body pairs `(i, j)`.
    pub fn resolve_body_pairs(&self, bodies: &mut [Body], pairs: &[(usize, usize)]) -> Vec<Contact> {
        let resolutions = self.map_pairs(pairs, |i, j| self.solve_body_pair(bodies, i, j));
        apply_resolutions(bodies, resolutions)
    }

    /// Resolves `(body, obstacle)` pairs against circle or rectangle obstacles.
    ///
    /// A later contact of the same body sees the velocity left by the earlier
    /// ones, and only the part of its depth they have not already removed.
    pub fn resolve_obstacle_pairs(&self, bodies: &mut [Body], obstacles: &[Obstacle], pairs: &[(usize, usize)]) -> Vec<Contact> {
        let hits = self.map_pairs(pairs, |b, o| self.detect_obstacle_pair(bodies, obstacles, b, o));

        let mut contacts = Vec::with_capacity(hits.len());
        for hit in hits.into_iter().flatten() {
            let body = &mut bodies[hit.contact.body];
            // Depth already removed along this normal by earlier contacts
            let moved = (body.position - hit.origin).dot(hit.pen.normal);
            let pen = Penetration { normal: hit.pen.normal, depth: (hit.pen.depth - moved).max(0.0) };

            let (resolved, delta) = self.solve_against_static(body, pen, hit.friction);
            delta.apply(body);
            if resolved {
                log::trace!("body {} <-> {:?}: depth {:.4}", hit.contact.body, hit.contact.kind, pen.depth);
            }
            contacts.push(Contact { resolved, ..hit.contact });
        }
        contacts
    }

    fn map_pairs<T, F>(&self, pairs: &[(usize, usize)], solve: F) -> Vec<Option<T>>
    where
        T: Send,
        F: Fn(usize, usize) -> Option<T> + Sync + Send,
    {
        if self.config.parallel {
            pairs.par_iter().map(|&(a, b)| solve(a, b)).collect()
        } else {
            pairs.iter().map(|&(a, b)| solve(a, b)).collect()
        }
    }

    /// Penetration left to correct after slop, scaled by the correction percent.
    fn correction(&self, depth: f64) -> f64 {
        (depth - self.config.correction_slop).max(0.0) * self.config.correction_percent
    }

    fn solve_body_pair(&self, bodies: &[Body], i: usize, j: usize) -> Option<Resolution> {
        let (a, b) = (&bodies[i], &bodies[j]);
        let pen = check_circle_circle(a.position, a.radius, b.position, b.radius)?;
        let n = pen.normal;

        let mut contact = Contact {
            body: i,
            kind: ContactKind::Body { other: j },
            normal: n,
            depth: pen.depth,
            resolved: false,
        };
        let mut delta_a = BodyDelta::default();
        let mut delta_b = BodyDelta::default();

        let relative_velocity_normal = (b.velocity - a.velocity).dot(n);
        if relative_velocity_normal < 0.0 {
            contact.resolved = true;
            let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
            let inv_sum = inv_a + inv_b;

            let e = self.config.restitution_rule.combine(a.material.restitution, b.material.restitution);
            let jn = -(1.0 + e) * relative_velocity_normal / inv_sum;
            let impulse = n * jn;
            delta_a.velocity -= impulse * inv_a;
            delta_b.velocity += impulse * inv_b;

            // Heavier body moves less
            let correction = n * (self.correction(pen.depth) / inv_sum);
            delta_a.position -= correction * inv_a;
            delta_b.position += correction * inv_b;

            if self.config.friction_enabled {
                let tangential = ((b.velocity + delta_b.velocity) - (a.velocity + delta_a.velocity)).reject(n);
                let speed = tangential.magnitude();
                if speed > DISTANCE_EPSILON {
                    let t = tangential / speed;
                    let mu = self.config.friction_rule.combine(a.material.friction, b.material.friction);
                    // Coulomb bound, and never more than stops the sliding
                    let jt = (mu * jn.abs()).min(speed / inv_sum);
                    delta_a.velocity += t * (jt * inv_a);
                    delta_b.velocity -= t * (jt * inv_b);
                }
            }
            log::trace!("body {i} <-> body {j}: depth {:.4}, jn {:.4}", pen.depth, jn);
        }

        Some(Resolution { contact, first: (i, delta_a), second: Some((j, delta_b)) })
    }

    fn detect_obstacle_pair(&self, bodies: &[Body], obstacles: &[Obstacle], b: usize, o: usize) -> Option<ObstacleHit> {
        let body = &bodies[b];
        let obstacle = &obstacles[o];
        let (pen, kind) = match obstacle.shape {
            Shape::Circle(circle) => (
                check_circle_circle(obstacle.position, circle.radius, body.position, body.radius)?,
                ContactKind::CircleObstacle { obstacle: o },
            ),
            Shape::Rect(rect) => (
                check_circle_rect(body.position, body.radius, obstacle.position, &rect)?,
                ContactKind::RectObstacle { obstacle: o },
            ),
        };

        Some(ObstacleHit {
            contact: Contact { body: b, kind, normal: pen.normal, depth: pen.depth, resolved: false },
            pen,
            origin: body.position,
            friction: self.config.friction_rule.combine(body.material.friction, obstacle.material.friction),
        })
    }

    /// Impulse, friction and correction of a body against something
    /// immovable. `pen.normal` points toward the body; restitution is the
    /// body's own.
    fn solve_against_static(&self, body: &Body, pen: Penetration, mu: f64) -> (bool, BodyDelta) {
        let n = pen.normal;
        let normal_speed = body.velocity.dot(n);
        if normal_speed >= 0.0 {
            return (false, BodyDelta::default());
        }

        // Velocity change along the normal; the obstacle takes none of it
        let dvn = -(1.0 + body.material.restitution) * normal_speed;
        let mut delta = BodyDelta {
            velocity: n * dvn,
            position: n * self.correction(pen.depth),
        };

        if self.config.friction_enabled {
            let tangential = (body.velocity + delta.velocity).reject(n);
            let speed = tangential.magnitude();
            if speed > DISTANCE_EPSILON {
                let dvt = (mu * dvn).min(speed);
                delta.velocity -= tangential * (dvt / speed);
            }
        }
        (true, delta)
    }
}

/// Adds every delta to its body in contact order and returns the contacts.
fn apply_resolutions(bodies: &mut [Body], resolutions: Vec<Option<Resolution>>) -> Vec<Contact> {
    let mut contacts = Vec::with_capacity(resolutions.len());
    for resolution in resolutions.into_iter().flatten() {
        for (index, delta) in std::iter::once(resolution.first).chain(resolution.second) {
            delta.apply(&mut bodies[index]);
        }
        contacts.push(resolution.contact);
    }
    contacts
}
