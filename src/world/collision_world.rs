use crate::{
    collision::{enumerate_pairs, Aabb, ColliderKind, ColliderSet, Contact, Lbvh, LbvhStats, PairSet},
    error::{CollisionError, Result},
    math::vec2::Vec2,
    objects::{Body, Obstacle},
    world::{Resolver, SolverConfig},
};

/// Summary of one call to [`CollisionWorld::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Every contact found this step, walls first, then body pairs, circle
    /// obstacles and rectangle obstacles.
    pub contacts: Vec<Contact>,
    pub node_count: usize,
    pub tree_depth: usize,
    pub body_pairs: usize,
    pub circle_pairs: usize,
    pub rect_pairs: usize,
}

impl StepReport {
    /// Contacts that changed a velocity (bodies were approaching).
    pub fn resolved_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(|contact| contact.resolved)
    }
}

/// Number of colliders of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColliderCounts {
    pub bodies: usize,
    pub circle_obstacles: usize,
    pub rect_obstacles: usize,
}

impl ColliderCounts {
    pub fn total(&self) -> usize {
        self.bodies + self.circle_obstacles + self.rect_obstacles
    }
}

/// Owns the bodies, obstacles and world bounds, and runs the collision
/// pipeline over them once per [`step`](Self::step).
///
/// Integration (gravity, velocity to position) is the caller's job and
/// happens between steps. Obstacles and bounds are never moved by a step.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    pub bodies: Vec<Body>,
    pub obstacles: Vec<Obstacle>,
    bounds: Aabb<2>,
    pub config: SolverConfig,
}

impl CollisionWorld {
    const DEFAULT_WIDTH: f64 = 12.0;
    const DEFAULT_HEIGHT: f64 = 8.0;

    /// Creates an empty world enclosed by `bounds`.
    pub fn new(bounds: Aabb<2>) -> Result<Self> {
        validate_bounds(&bounds)?;
        Ok(Self {
            bodies: Vec::new(),
            obstacles: Vec::new(),
            bounds,
            config: SolverConfig::default(),
        })
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bounds(&self) -> &Aabb<2> {
        &self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Aabb<2>) -> Result<()> {
        validate_bounds(&bounds)?;
        self.bounds = bounds;
        Ok(())
    }

    /// Adds a body and returns its index.
    pub fn add_body(&mut self, body: Body) -> Result<usize> {
        let index = self.bodies.len();
        if let Some(reason) = body.validate() {
            return Err(CollisionError::InvalidBody { index, reason });
        }
        self.bodies.push(body);
        Ok(index)
    }

    /// Adds a static obstacle and returns its index.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> Result<usize> {
        let index = self.obstacles.len();
        if let Some(reason) = obstacle.validate() {
            return Err(CollisionError::InvalidObstacle { index, reason });
        }
        self.obstacles.push(obstacle);
        Ok(index)
    }

    /// Broad phase only: the overlapping body/obstacle pairs for the current
    /// positions, without resolving them.
    pub fn build_pairs(&self) -> Result<PairSet> {
        Ok(self.broad_phase()?.0)
    }

    /// Runs one collision step: AABB build, Morton encode, LBVH build, pair
    /// enumeration and contact resolution, in that order.
    ///
    /// Bodies, obstacles and the config are validated first because their
    /// fields are public and may have been changed since they were set. On
    /// error nothing is modified.
    pub fn step(&mut self) -> Result<StepReport> {
        if let Err(err) = self.validate() {
            log::warn!("collision step skipped: {err}");
            return Err(err);
        }

        let (pairs, stats) = self.broad_phase()?;
        let resolver = Resolver::new(self.config);
        let contacts = resolver.resolve(&mut self.bodies, &self.obstacles, &self.bounds, &pairs);

        log::debug!(
            "collision step: {} colliders, {} nodes (depth {}), pairs {}/{}/{}, {} contacts",
            self.bodies.len() + self.obstacles.len(),
            stats.node_count,
            stats.max_depth,
            pairs.body_body.len(),
            pairs.body_circle.len(),
            pairs.body_rect.len(),
            contacts.len(),
        );

        Ok(StepReport {
            contacts,
            node_count: stats.node_count,
            tree_depth: stats.max_depth,
            body_pairs: pairs.body_body.len(),
            circle_pairs: pairs.body_circle.len(),
            rect_pairs: pairs.body_rect.len(),
        })
    }

    /// Total kinetic energy of all bodies, Σ ½ m |v|².
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Total linear momentum of all bodies.
    pub fn momentum(&self) -> Vec2 {
        self.bodies.iter().fold(Vec2::ZERO, |acc, body| acc + body.velocity * body.mass)
    }

    pub fn collider_counts(&self) -> ColliderCounts {
        let mut counts = ColliderCounts { bodies: self.bodies.len(), ..ColliderCounts::default() };
        for obstacle in &self.obstacles {
            match obstacle.kind() {
                ColliderKind::CircleObstacle => counts.circle_obstacles += 1,
                ColliderKind::RectObstacle => counts.rect_obstacles += 1,
                ColliderKind::Body => {}
            }
        }
        counts
    }

    fn broad_phase(&self) -> Result<(PairSet, LbvhStats)> {
        let parallel = self.config.parallel;
        let colliders = ColliderSet::build(&self.bodies, &self.obstacles, parallel)?;
        let kinds: Vec<ColliderKind> = colliders.handles.iter().map(|handle| handle.kind).collect();
        let bvh = Lbvh::build(&colliders.aabbs, &kinds, &self.bounds, parallel)?;
        let overlaps = enumerate_pairs(&bvh)?;
        Ok((PairSet::partition(&overlaps, &colliders.handles), bvh.stats()))
    }

    fn validate(&self) -> Result<()> {
        validate_bounds(&self.bounds)?;
        if let Some(reason) = self.config.validate() {
            return Err(CollisionError::InvalidConfig(reason));
        }
        for (index, body) in self.bodies.iter().enumerate() {
            if let Some(reason) = body.validate() {
                return Err(CollisionError::InvalidBody { index, reason });
            }
        }
        for (index, obstacle) in self.obstacles.iter().enumerate() {
            if let Some(reason) = obstacle.validate() {
                return Err(CollisionError::InvalidObstacle { index, reason });
            }
        }
        Ok(())
    }
}

impl Default for CollisionWorld {
    /// Empty 12 x 8 world with its lower-left corner at the origin.
    fn default() -> Self {
        Self {
            bodies: Vec::new(),
            obstacles: Vec::new(),
            bounds: Aabb::new([0.0, 0.0], [Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT]),
            config: SolverConfig::default(),
        }
    }
}

fn validate_bounds(bounds: &Aabb<2>) -> Result<()> {
    if !bounds.is_finite() {
        return Err(CollisionError::InvalidBounds("coordinates must be finite"));
    }
    if (0..2).any(|i| bounds.min[i] > bounds.max[i]) {
        return Err(CollisionError::InvalidBounds("min must not exceed max"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{brute_force_pairs, BoundarySide, ContactKind};
    use crate::common::Material;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPSILON: f64 = 1e-9;

    fn random_world(seed: u64, bodies: usize, parallel: bool) -> CollisionWorld {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = CollisionWorld::new(Aabb::new([0.0, 0.0], [60.0, 40.0]))
            .unwrap()
            .with_config(SolverConfig { parallel, ..SolverConfig::default() });
        for _ in 0..bodies {
            let body = Body::new(rng.gen_range(0.5..3.0), rng.gen_range(0.2..1.0))
                .with_position(Vec2::new(rng.gen_range(0.0..60.0), rng.gen_range(0.0..40.0)))
                .with_velocity(Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)))
                .with_material(Material::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)));
            world.add_body(body).unwrap();
        }
        world.add_obstacle(Obstacle::circle(Vec2::new(20.0, 20.0), 3.0)).unwrap();
        world.add_obstacle(Obstacle::rect(Vec2::new(40.0, 10.0), 8.0, 2.0)).unwrap();
        world.add_obstacle(Obstacle::rect(Vec2::new(45.0, 30.0), 1.0, 12.0)).unwrap();
        world
    }

    #[test]
    fn test_new_rejects_bad_bounds() {
        assert!(matches!(
            CollisionWorld::new(Aabb { min: [0.0, 5.0], max: [10.0, 1.0] }),
            Err(CollisionError::InvalidBounds(_))
        ));
        assert!(CollisionWorld::new(Aabb::new([0.0, 0.0], [f64::INFINITY, 1.0])).is_err());

        let mut world = CollisionWorld::default();
        assert!(world.set_bounds(Aabb { min: [f64::NAN, 0.0], max: [1.0, 1.0] }).is_err());
        assert_eq!(world.bounds().max, [12.0, 8.0]);
    }

    #[test]
    fn test_add_rejects_invalid_objects() {
        let mut world = CollisionWorld::default();
        assert_eq!(world.add_body(Body::new(1.0, 0.5)).unwrap(), 0);
        assert!(matches!(
            world.add_body(Body::new(-1.0, 0.5)),
            Err(CollisionError::InvalidBody { index: 1, .. })
        ));
        let mut bad = Obstacle::circle(Vec2::ZERO, 1.0);
        bad.position.x = f64::NAN;
        assert!(matches!(world.add_obstacle(bad), Err(CollisionError::InvalidObstacle { index: 0, .. })));
        assert_eq!(world.bodies.len(), 1);
        assert!(world.obstacles.is_empty());
    }

    #[test]
    fn test_step_empty_and_single() {
        let mut world = CollisionWorld::default();
        let report = world.step().unwrap();
        assert_eq!(report, StepReport::default());

        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(6.0, 4.0))).unwrap();
        let report = world.step().unwrap();
        assert!(report.contacts.is_empty());
        assert_eq!(report.node_count, 1);
        assert_eq!(report.body_pairs + report.circle_pairs + report.rect_pairs, 0);
    }

    #[test]
    fn test_step_skips_invalid_body() {
        let mut world = CollisionWorld::default();
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(1.0, 1.0))).unwrap();
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(1.5, 1.0))).unwrap();
        world.bodies[1].velocity.y = f64::NAN;
        let before = world.bodies[0];
        assert!(matches!(world.step(), Err(CollisionError::InvalidBody { index: 1, .. })));
        assert_eq!(world.bodies[0], before);
    }

    #[test]
    fn test_step_skips_invalid_config() {
        let mut world = CollisionWorld::default();
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(6.0, 0.3))).unwrap();
        let before = world.bodies[0];

        world.config.correction_percent = f64::NAN;
        assert!(matches!(world.step(), Err(CollisionError::InvalidConfig(_))));
        world.config.correction_percent = 1.0;
        world.config.correction_slop = -0.5;
        assert!(matches!(world.step(), Err(CollisionError::InvalidConfig(_))));
        assert_eq!(world.bodies[0], before);

        world.config.correction_slop = 0.0;
        world.step().unwrap();
        assert!(world.bodies[0].position.is_finite());
        assert!((world.bodies[0].position.y - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_falling_body_bounces_off_floor() {
        let mut world = CollisionWorld::default();
        world
            .add_body(
                Body::new(1.0, 0.5)
                    .with_position(Vec2::new(6.0, 0.4))
                    .with_velocity(Vec2::new(0.0, -3.0))
                    .with_material(Material::frictionless(1.0)),
            )
            .unwrap();
        let energy = world.kinetic_energy();
        let report = world.step().unwrap();
        assert_eq!(report.contacts.len(), 1);
        assert_eq!(report.contacts[0].kind, ContactKind::Boundary(BoundarySide::Bottom));
        assert!((world.bodies[0].velocity.y - 3.0).abs() < EPSILON);
        assert!((world.bodies[0].position.y - 0.5).abs() < EPSILON);
        assert!((world.kinetic_energy() - energy).abs() < EPSILON);
    }

    #[test]
    fn test_step_resolves_every_category() {
        let mut world = CollisionWorld::default();
        // Two bodies approaching each other
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(2.0, 4.0)).with_velocity(Vec2::new(1.0, 0.0))).unwrap();
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(2.8, 4.0)).with_velocity(Vec2::new(-1.0, 0.0))).unwrap();
        // Body falling onto a circle obstacle and one onto a rectangle
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(6.0, 5.4)).with_velocity(Vec2::new(0.0, -1.0))).unwrap();
        world.add_body(Body::new(1.0, 0.5).with_position(Vec2::new(10.0, 3.4)).with_velocity(Vec2::new(0.0, -1.0))).unwrap();
        world.add_obstacle(Obstacle::circle(Vec2::new(6.0, 4.0), 1.0)).unwrap();
        world.add_obstacle(Obstacle::rect(Vec2::new(10.0, 2.0), 2.0, 2.0)).unwrap();

        let report = world.step().unwrap();
        assert_eq!((report.body_pairs, report.circle_pairs, report.rect_pairs), (1, 1, 1));
        let kinds: Vec<ContactKind> = report.contacts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContactKind::Body { other: 1 },
                ContactKind::CircleObstacle { obstacle: 0 },
                ContactKind::RectObstacle { obstacle: 1 },
            ]
        );
        assert_eq!(report.resolved_contacts().count(), 3);
        assert!(world.bodies[0].velocity.x < 0.0);
        assert!(world.bodies[1].velocity.x > 0.0);
        assert!(world.bodies[2].velocity.y > 0.0);
        assert!(world.bodies[3].velocity.y > 0.0);
        // Obstacles are never moved
        assert_eq!(world.obstacles[0].position, Vec2::new(6.0, 4.0));
        assert_eq!(world.obstacles[1].position, Vec2::new(10.0, 2.0));
    }

    #[test]
    fn test_build_pairs_matches_brute_force() {
        let world = random_world(7, 500, true);
        let pairs = world.build_pairs().unwrap();

        let colliders = ColliderSet::build(&world.bodies, &world.obstacles, false).unwrap();
        let kinds: Vec<ColliderKind> = colliders.handles.iter().map(|h| h.kind).collect();
        let expected = PairSet::partition(&brute_force_pairs(&colliders.aabbs, &kinds), &colliders.handles);

        let sorted = |mut v: Vec<(usize, usize)>| {
            v.sort_unstable();
            v
        };
        assert_eq!(sorted(pairs.body_body), sorted(expected.body_body));
        assert_eq!(sorted(pairs.body_circle), sorted(expected.body_circle));
        assert_eq!(sorted(pairs.body_rect), sorted(expected.body_rect));
    }

    #[test]
    fn test_step_is_deterministic_across_modes() {
        let mut serial = random_world(42, 800, false);
        let mut parallel = random_world(42, 800, true);
        for _ in 0..5 {
            let a = serial.step().unwrap();
            let b = parallel.step().unwrap();
            assert_eq!(a, b);
            for body in serial.bodies.iter_mut().chain(parallel.bodies.iter_mut()) {
                body.position += body.velocity * 0.01;
            }
        }
        assert_eq!(serial.bodies, parallel.bodies);
    }

    #[test]
    fn test_momentum_conserved_between_free_bodies() {
        let mut world = CollisionWorld::new(Aabb::new([-100.0, -100.0], [100.0, 100.0])).unwrap();
        world.add_body(Body::new(2.0, 1.0).with_velocity(Vec2::new(3.0, 1.0))).unwrap();
        world
            .add_body(Body::new(5.0, 1.0).with_position(Vec2::new(1.5, 0.5)).with_velocity(Vec2::new(-2.0, 0.0)))
            .unwrap();
        let before = world.momentum();
        world.step().unwrap();
        let after = world.momentum();
        assert!((before - after).magnitude() < EPSILON);
    }

    #[test]
    fn test_collider_counts() {
        let mut world = random_world(1, 10, false);
        world.add_obstacle(Obstacle::circle(Vec2::new(5.0, 5.0), 0.5)).unwrap();
        let counts = world.collider_counts();
        assert_eq!(counts, ColliderCounts { bodies: 10, circle_obstacles: 2, rect_obstacles: 2 });
        assert_eq!(counts.total(), 14);
    }
}
