//! Optional record of every applied fire event.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    #[default]
    Off,
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireEvent {
    pub time: f64,
    pub weapon: String,
    pub damage: f64,
    pub health_after: f64,
    pub ammo_after: u32,
    pub reloaded: bool,
}

/// Collects events only when enabled, so the hot loop pays nothing with tracing off.
#[derive(Debug, Default)]
pub struct TraceCollector {
    enabled: bool,
    events: Vec<FireEvent>,
}

impl TraceCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, event: impl FnOnce() -> FireEvent) {
        if self.enabled {
            self.events.push(event());
        }
    }

    pub fn into_events(self) -> Vec<FireEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FireEvent {
        FireEvent {
            time: 0.0,
            weapon: "Punisher".to_string(),
            damage: 10.0,
            health_after: 90.0,
            ammo_after: 4,
            reloaded: false,
        }
    }

    #[test]
    fn disabled_collector_drops_events() {
        let mut trace = TraceCollector::new(false);
        trace.record(sample);
        assert!(trace.into_events().is_empty());
    }

    #[test]
    fn enabled_collector_keeps_order() {
        let mut trace = TraceCollector::new(true);
        trace.record(sample);
        trace.record(|| FireEvent {
            time: 1.0,
            ..sample()
        });
        let events = trace.into_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].time, 1.0);
    }
}
