//! Seeded synthetic scenes for load testing
//!
//! Generates a plausible pit: equipment scattered over the domain box with a
//! realistic kind and status mix, and a grade grid built from a few ore
//! bodies plus noise. The same seed always yields the same scene.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::equipment::{EquipmentKind, EquipmentPosition, EquipmentStatus, Telemetry};
use crate::domain::grade::{GradeData, GridBounds};
use crate::domain::snapshot::SceneSnapshot;
use crate::error::SceneResult;
use crate::foundation::math::{constants, Vec3};
use crate::scene::coordinates::{Bounds3, SpacePosition};

/// Parameters of a synthetic scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticScenario {
    /// RNG seed
    pub seed: u64,
    /// Number of equipment records
    pub equipment_count: usize,
    /// Grade grid rows; 0 disables the grid
    pub grid_rows: usize,
    /// Grade grid columns; 0 disables the grid
    pub grid_cols: usize,
    /// Largest per-update move in domain units
    pub max_step: f32,
}

impl Default for SyntheticScenario {
    fn default() -> Self {
        Self { seed: 7, equipment_count: 30, grid_rows: 20, grid_cols: 20, max_step: 2.0 }
    }
}

impl SyntheticScenario {
    /// Build the initial snapshot inside `domain`
    pub fn generate(&self, domain: &Bounds3) -> SceneResult<SceneSnapshot> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let equipment = (0..self.equipment_count).map(|i| random_equipment(&mut rng, i, domain)).collect();
        let grade = if self.grid_rows > 0 && self.grid_cols > 0 {
            Some(random_grade(&mut rng, self.grid_rows, self.grid_cols, domain)?)
        } else {
            None
        };
        Ok(SceneSnapshot { sequence: 0, equipment, grade })
    }

    /// A feed producing successive snapshots with equipment drifting around
    pub fn feed(&self, domain: Bounds3) -> SceneResult<SyntheticFeed> {
        let base = self.generate(&domain)?;
        Ok(SyntheticFeed {
            rng: StdRng::seed_from_u64(self.seed.wrapping_add(1)),
            domain,
            max_step: self.max_step,
            current: base,
        })
    }
}

fn pick_kind(rng: &mut StdRng) -> EquipmentKind {
    // Haul fleets are mostly trucks
    match rng.gen_range(0..10) {
        0..=1 => EquipmentKind::Excavator,
        2..=7 => EquipmentKind::Truck,
        _ => EquipmentKind::Conveyor,
    }
}

fn pick_status(rng: &mut StdRng) -> EquipmentStatus {
    match rng.gen_range(0..20) {
        0..=13 => EquipmentStatus::Operating,
        14..=16 => EquipmentStatus::Idle,
        17..=18 => EquipmentStatus::Maintenance,
        _ => EquipmentStatus::Error,
    }
}

fn random_equipment(rng: &mut StdRng, index: usize, domain: &Bounds3) -> EquipmentPosition {
    let kind = pick_kind(rng);
    let prefix = match kind {
        EquipmentKind::Excavator => "EX",
        EquipmentKind::Truck => "HT",
        EquipmentKind::Conveyor => "CV",
    };
    let position = Vec3::new(
        rng.gen_range(domain.x.min..=domain.x.max),
        rng.gen_range(domain.y.min..=domain.y.max),
        rng.gen_range(domain.z.min..=domain.z.max),
    );
    let telemetry = Telemetry {
        speed: (kind != EquipmentKind::Conveyor).then(|| rng.gen_range(0.0..40.0)),
        payload: (kind == EquipmentKind::Truck).then(|| rng.gen_range(0.0..240.0)),
        temperature: Some(rng.gen_range(60.0..110.0)),
    };
    EquipmentPosition {
        id: format!("{prefix}-{index:03}"),
        kind,
        position: SpacePosition::Domain(position),
        rotation: Vec3::new(0.0, rng.gen_range(0.0..constants::PI * 2.0), 0.0),
        status: pick_status(rng),
        telemetry,
    }
}

fn random_grade(rng: &mut StdRng, rows: usize, cols: usize, domain: &Bounds3) -> SceneResult<GradeData> {
    // A few Gaussian ore bodies in normalized grid space
    let bodies: Vec<(f32, f32, f32, f32)> = (0..3)
        .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.08..0.25), rng.gen_range(1.5..3.5)))
        .collect();

    let grid: Vec<Vec<f32>> = (0..rows)
        .map(|row| {
            let v = (row as f32 + 0.5) / rows as f32;
            (0..cols)
                .map(|col| {
                    let u = (col as f32 + 0.5) / cols as f32;
                    let ore: f32 = bodies
                        .iter()
                        .map(|&(cu, cv, spread, peak)| {
                            let d2 = (u - cu).powi(2) + (v - cv).powi(2);
                            peak * (-d2 / (2.0 * spread * spread)).exp()
                        })
                        .sum();
                    (0.2 + ore + rng.gen_range(-0.15..0.15)).clamp(0.0, 4.0)
                })
                .collect::<Vec<f32>>()
        })
        .collect();

    let bounds = GridBounds { min_x: domain.x.min, max_x: domain.x.max, min_y: domain.y.min, max_y: domain.y.max };
    GradeData::new(grid, rows, cols, bounds)
}

/// Endless source of drifting snapshots
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    rng: StdRng,
    domain: Bounds3,
    max_step: f32,
    current: SceneSnapshot,
}

impl SyntheticFeed {
    /// Next snapshot; the first call returns the generated scene unchanged
    ///
    /// Later snapshots omit the grade grid, which only changes with a new survey.
    pub fn next_snapshot(&mut self) -> SceneSnapshot {
        if self.current.sequence == 0 {
            self.current.sequence = 1;
            return self.current.clone();
        }

        self.current.sequence += 1;
        let step = self.max_step.max(0.0);
        for item in &mut self.current.equipment {
            // Conveyors are fixed installations
            if item.kind == EquipmentKind::Conveyor || step == 0.0 {
                continue;
            }
            if let SpacePosition::Domain(p) = &mut item.position {
                p.x = (p.x + self.rng.gen_range(-step..=step)).clamp(self.domain.x.min, self.domain.x.max);
                p.y = (p.y + self.rng.gen_range(-step..=step)).clamp(self.domain.y.min, self.domain.y.max);
            }
        }
        SceneSnapshot { grade: None, ..self.current.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_scene() {
        let scenario = SyntheticScenario::default();
        let domain = Bounds3::mining_default();
        assert_eq!(scenario.generate(&domain).unwrap(), scenario.generate(&domain).unwrap());

        let other = SyntheticScenario { seed: 8, ..scenario.clone() };
        assert_ne!(scenario.generate(&domain).unwrap(), other.generate(&domain).unwrap());
    }

    #[test]
    fn test_generated_scene_is_inside_domain() {
        let domain = Bounds3::mining_default();
        let scenario = SyntheticScenario { equipment_count: 200, ..SyntheticScenario::default() };
        let snapshot = scenario.generate(&domain).unwrap();

        assert_eq!(snapshot.equipment.len(), 200);
        assert!(snapshot.equipment.iter().all(|e| domain.contains(&e.position.raw())));
        let grade = snapshot.grade.unwrap();
        assert_eq!((grade.rows(), grade.cols()), (20, 20));
        assert!(grade.stats().min >= 0.0 && grade.stats().max <= 4.0);
    }

    #[test]
    fn test_grid_can_be_disabled() {
        let scenario = SyntheticScenario { grid_rows: 0, ..SyntheticScenario::default() };
        assert!(scenario.generate(&Bounds3::mining_default()).unwrap().grade.is_none());
    }

    #[test]
    fn test_feed_drifts_within_bounds() {
        let domain = Bounds3::mining_default();
        let mut feed = SyntheticScenario::default().feed(domain).unwrap();

        let first = feed.next_snapshot();
        assert_eq!(first.sequence, 1);
        assert!(first.grade.is_some());

        let latest = (0..50).map(|_| feed.next_snapshot()).last().unwrap();
        assert_eq!(latest.sequence, 51);
        assert!(latest.grade.is_none());
        assert!(latest.equipment.iter().all(|e| domain.contains(&e.position.raw())));
        assert_eq!(latest.equipment.len(), first.equipment.len());
    }
}
