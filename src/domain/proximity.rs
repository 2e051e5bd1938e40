// Proximity monitoring state machine
use super::geo::distance;
use super::target::{ObserverFix, Target};
use serde::{Deserialize, Serialize};

/// Alert radius around the target, in meters
pub const ALERT_RADIUS_METERS: f64 = 200.0;

/// How fixes inside the radius turn into alerts.
///
/// `Level` alerts on every fix inside the radius, so a stationary observer is
/// notified on each update. `Edge` alerts only when a fix moves the observer
/// from outside to inside; the first fix after a target change never alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    #[default]
    Level,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// No target set
    Unarmed,
    /// Target set, no fix evaluated against it yet
    Armed,
    /// At least one fix evaluated against the current target
    Evaluating,
}

/// Identifies which target a fix was captured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TargetGeneration(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityState {
    pub target: Option<Target>,
    pub last_fix: Option<ObserverFix>,
    /// Classification of `last_fix` against `target`; `None` means unknown
    pub was_inside: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub target: Target,
    pub fix: ObserverFix,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// No target; the fix was ignored
    Unarmed,
    /// The fix was captured against a replaced target and was discarded
    StaleTarget,
    Evaluated {
        distance_meters: f64,
        inside: bool,
        alert: Option<AlertEvent>,
    },
}

impl FixOutcome {
    pub fn into_alert(self) -> Option<AlertEvent> {
        match self {
            FixOutcome::Evaluated { alert, .. } => alert,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProximityMonitor {
    mode: AlertMode,
    state: ProximityState,
    generation: TargetGeneration,
}

impl ProximityMonitor {
    pub fn new(mode: AlertMode) -> Self {
        Self {
            mode,
            state: ProximityState::default(),
            generation: TargetGeneration::default(),
        }
    }

    pub fn mode(&self) -> AlertMode {
        self.mode
    }

    pub fn state(&self) -> &ProximityState {
        &self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.state.target.as_ref()
    }

    pub fn generation(&self) -> TargetGeneration {
        self.generation
    }

    pub fn phase(&self) -> MonitorPhase {
        match (&self.state.target, &self.state.last_fix) {
            (None, _) => MonitorPhase::Unarmed,
            (Some(_), None) => MonitorPhase::Armed,
            (Some(_), Some(_)) => MonitorPhase::Evaluating,
        }
    }

    /// Replace the target. Never alerts; the next fix is evaluated fresh.
    pub fn set_target(&mut self, target: Target) -> TargetGeneration {
        self.state = ProximityState {
            target: Some(target),
            last_fix: None,
            was_inside: None,
        };
        self.generation = TargetGeneration(self.generation.0 + 1);
        self.generation
    }

    pub fn on_fix(&mut self, fix: ObserverFix) -> Option<AlertEvent> {
        self.evaluate(fix).into_alert()
    }

    /// Evaluate a fix that was captured while `generation` was current.
    pub fn evaluate_for(&mut self, generation: TargetGeneration, fix: ObserverFix) -> FixOutcome {
        if self.state.target.is_none() {
            return FixOutcome::Unarmed;
        }
        if generation != self.generation {
            return FixOutcome::StaleTarget;
        }
        self.evaluate(fix)
    }

    pub fn evaluate(&mut self, fix: ObserverFix) -> FixOutcome {
        let Some(target) = &self.state.target else {
            return FixOutcome::Unarmed;
        };

        let distance_meters = distance(&target.coordinate, &fix.coordinate);
        let inside = distance_meters <= ALERT_RADIUS_METERS;

        let should_alert = match self.mode {
            AlertMode::Level => inside,
            AlertMode::Edge => inside && self.state.was_inside == Some(false),
        };
        let alert = should_alert.then(|| AlertEvent {
            target: target.clone(),
            fix: fix.clone(),
            distance_meters,
        });

        self.state.last_fix = Some(fix);
        self.state.was_inside = Some(inside);

        FixOutcome::Evaluated {
            distance_meters,
            inside,
            alert,
        }
    }
}

impl Default for ProximityMonitor {
    fn default() -> Self {
        Self::new(AlertMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::Coordinate;
    use chrono::{Duration, TimeZone, Utc};

    const UMBC: Coordinate = Coordinate {
        latitude: 39.2557,
        longitude: -76.7112,
    };

    fn umbc() -> Target {
        Target::named(UMBC, "UMBC")
    }

    fn fix_at(latitude: f64, longitude: f64, seconds: i64) -> ObserverFix {
        let base = Utc.with_ymd_and_hms(2016, 4, 27, 12, 0, 0).unwrap();
        ObserverFix::new(
            Coordinate::new(latitude, longitude),
            base + Duration::seconds(seconds),
        )
    }

    // ~189 m north of UMBC
    fn inside_fix(seconds: i64) -> ObserverFix {
        fix_at(39.2574, -76.7112, seconds)
    }

    // ~211 m north of UMBC
    fn just_outside_fix(seconds: i64) -> ObserverFix {
        fix_at(39.2576, -76.7112, seconds)
    }

    // ~5 km north of UMBC
    fn far_fix(seconds: i64) -> ObserverFix {
        fix_at(39.3007, -76.7112, seconds)
    }

    #[test]
    fn test_phases() {
        let mut monitor = ProximityMonitor::default();
        assert_eq!(monitor.phase(), MonitorPhase::Unarmed);

        monitor.set_target(umbc());
        assert_eq!(monitor.phase(), MonitorPhase::Armed);

        monitor.on_fix(far_fix(0));
        assert_eq!(monitor.phase(), MonitorPhase::Evaluating);
        assert_eq!(monitor.state().was_inside, Some(false));

        monitor.set_target(Target::new(Coordinate::new(40.0, -75.0)));
        assert_eq!(monitor.phase(), MonitorPhase::Armed);
        assert_eq!(monitor.state().was_inside, None);
        assert!(monitor.state().last_fix.is_none());
    }

    #[test]
    fn test_unarmed_ignores_fixes() {
        let mut monitor = ProximityMonitor::default();
        assert_eq!(monitor.evaluate(inside_fix(0)), FixOutcome::Unarmed);
        assert!(monitor.on_fix(fix_at(39.2557, -76.7112, 1)).is_none());
        assert_eq!(monitor.phase(), MonitorPhase::Unarmed);
        assert_eq!(monitor.state(), &ProximityState::default());
    }

    #[test]
    fn test_umbc_scenario() {
        let mut monitor = ProximityMonitor::new(AlertMode::Level);
        monitor.set_target(umbc());

        let alert = monitor
            .on_fix(fix_at(39.2557, -76.7112, 0))
            .expect("fix at target alerts");
        assert_eq!(alert.distance_meters, 0.0);
        assert_eq!(alert.target, umbc());

        match monitor.evaluate(far_fix(10)) {
            FixOutcome::Evaluated {
                distance_meters,
                inside,
                alert,
            } => {
                assert!((distance_meters - 5000.0).abs() < 50.0, "got {}", distance_meters);
                assert!(!inside);
                assert!(alert.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_radius_boundary() {
        let mut monitor = ProximityMonitor::new(AlertMode::Level);
        monitor.set_target(umbc());
        assert!(monitor.on_fix(inside_fix(0)).is_some());
        assert!(monitor.on_fix(just_outside_fix(5)).is_none());
    }

    #[test]
    fn test_level_alerts_on_every_inside_fix() {
        let mut monitor = ProximityMonitor::new(AlertMode::Level);
        monitor.set_target(umbc());

        // first fix alerts on its own
        assert!(monitor.on_fix(inside_fix(0)).is_some());
        assert!(monitor.on_fix(inside_fix(10)).is_some());
        assert!(monitor.on_fix(far_fix(20)).is_none());
        assert!(monitor.on_fix(inside_fix(30)).is_some());
    }

    #[test]
    fn test_edge_alerts_only_on_entry() {
        let mut monitor = ProximityMonitor::new(AlertMode::Edge);
        monitor.set_target(umbc());

        // first sample never alerts, and staying inside does not either
        assert!(monitor.on_fix(inside_fix(0)).is_none());
        assert!(monitor.on_fix(inside_fix(10)).is_none());

        assert!(monitor.on_fix(far_fix(20)).is_none());
        let alert = monitor.on_fix(inside_fix(30)).expect("entry alerts");
        assert!(alert.distance_meters <= ALERT_RADIUS_METERS);
        assert!(monitor.on_fix(inside_fix(40)).is_none());
    }

    #[test]
    fn test_target_change_does_not_alert() {
        let mut monitor = ProximityMonitor::new(AlertMode::Edge);
        monitor.set_target(Target::new(Coordinate::new(40.0, -75.0)));
        assert!(monitor.on_fix(inside_fix(0)).is_none());

        // observer is already inside the new target's radius
        monitor.set_target(umbc());
        assert!(monitor.on_fix(inside_fix(10)).is_none());
    }

    #[test]
    fn test_stale_timestamps_are_evaluated() {
        let mut monitor = ProximityMonitor::new(AlertMode::Level);
        monitor.set_target(umbc());
        assert!(monitor.on_fix(inside_fix(100)).is_some());
        assert!(monitor.on_fix(inside_fix(100)).is_some());
        assert!(monitor.on_fix(inside_fix(50)).is_some());
        assert_eq!(monitor.state().last_fix, Some(inside_fix(50)));
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut monitor = ProximityMonitor::new(AlertMode::Edge);
        let old = monitor.set_target(Target::new(Coordinate::new(40.0, -75.0)));
        let new = monitor.set_target(umbc());
        assert!(new > old);

        assert_eq!(monitor.evaluate_for(old, far_fix(0)), FixOutcome::StaleTarget);
        assert_eq!(monitor.phase(), MonitorPhase::Armed);

        // the stale fix did not consume the first-fix rule
        match monitor.evaluate_for(new, inside_fix(5)) {
            FixOutcome::Evaluated { inside, alert, .. } => {
                assert!(inside);
                assert!(alert.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_for_without_target() {
        let mut monitor = ProximityMonitor::default();
        assert_eq!(
            monitor.evaluate_for(TargetGeneration::default(), inside_fix(0)),
            FixOutcome::Unarmed
        );
    }
}
