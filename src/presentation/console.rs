// Console output for targets, positions and proximity alerts
use crate::application::proximity_service::ProximityObserver;
use crate::domain::proximity::{AlertEvent, ALERT_RADIUS_METERS};
use crate::domain::target::{ObserverFix, Target};

#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn alert_message(event: &AlertEvent) -> String {
        format!(
            "Within {}meters of {}",
            ALERT_RADIUS_METERS as u32,
            event.target.display_name()
        )
    }
}

impl ProximityObserver for ConsoleObserver {
    fn on_target_selected(&self, target: &Target) {
        println!("Place: {}", target.display_name());
        tracing::info!("Marker placed at {}", target.coordinate);
    }

    fn on_target_restored(&self, target: &Target) {
        tracing::info!("Marker restored at {}", target.coordinate);
    }

    fn on_position(&self, fix: &ObserverFix) {
        tracing::debug!("{} at {}", fix.coordinate, fix.timestamp);
    }

    fn on_alert(&self, event: &AlertEvent) {
        println!("{}", Self::alert_message(event));
        tracing::info!(
            distance_meters = event.distance_meters,
            "Proximity alert for {}",
            event.target.display_name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::Coordinate;

    #[test]
    fn test_alert_message() {
        let event = AlertEvent {
            target: Target::named(Coordinate::new(39.2557, -76.7112), "UMBC"),
            fix: ObserverFix::now(Coordinate::new(39.2557, -76.7112)),
            distance_meters: 0.0,
        };
        assert_eq!(ConsoleObserver::alert_message(&event), "Within 200meters of UMBC");
    }
}
