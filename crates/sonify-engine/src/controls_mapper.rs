//! Controls Mapper: metrics -> musical controls, pure and deterministic.
//!
//! Table-driven linear maps followed by a clamp, per the contract:
//!
//! | metric          | target       | mapping                          |
//! |-----------------|--------------|-----------------------------------|
//! | ctr              | tempo_bpm    | `60 + ctr*120`                     |
//! | impressions      | velocity     | `40 + impressions*87`              |
//! | position         | transpose    | `round((position-0.5)*24)`         |
//! | clicks           | filter_cc74  | `round(clicks*127)`                |
//! | mean(ctr,clicks) | reverb_cc91  | `round(mean*127)`                  |
//!
//! The series dominates sectioning (via the Arranger); metrics dominate
//! tempo/velocity here. When a flat series disagrees strongly with high
//! metrics, tempo/velocity follow the metrics and section count/shape
//! follows the series — this is an intentional, documented interaction
//! rather than a bug.

use sonify_spec::{Controls, ControlsOverride, Metrics};

pub fn map_controls(metrics: &Metrics, overrides: &ControlsOverride) -> Controls {
    let ctr = metrics.ctr();
    let impressions = metrics.impressions();
    let position = metrics.position();
    let clicks = metrics.clicks();
    let mean_ctr_clicks = (ctr + clicks) / 2.0;

    let base = Controls {
        tempo_bpm: (60.0 + ctr * 120.0).round() as i32,
        velocity: (40.0 + impressions * 87.0).round() as i32,
        transpose: ((position - 0.5) * 24.0).round() as i32,
        filter_cc74: (clicks * 127.0).round() as i32,
        reverb_cc91: (mean_ctr_clicks * 127.0).round() as i32,
        bars: None,
    }
    .clamp_all();

    overrides.apply(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(ctr: f64, impressions: f64, position: f64, clicks: f64) -> Metrics {
        Metrics {
            ctr: Some(ctr),
            impressions: Some(impressions),
            position: Some(position),
            clicks: Some(clicks),
            volatility_index: None,
        }
    }

    #[test]
    fn neutral_flat_scenario() {
        let m = metrics(0.5, 0.5, 0.5, 0.5);
        let c = map_controls(&m, &ControlsOverride::default());
        assert_eq!(c.tempo_bpm, 120);
        assert_eq!(c.velocity, 84);
        assert_eq!(c.transpose, 0);
        assert_eq!(c.filter_cc74, 64);
        assert_eq!(c.reverb_cc91, 64);
    }

    #[test]
    fn positive_ramp_scenario_tempo() {
        let m = metrics(0.8, 0.7, 0.85, 0.6);
        let c = map_controls(&m, &ControlsOverride::default());
        // 60 + 0.8*120 = 156, clamped to global [60,180] range stays 156;
        // palette-specific clamping happens downstream in the arranger.
        assert_eq!(c.tempo_bpm, 156);
    }

    #[test]
    fn override_replaces_mapped_field_after_clamp() {
        let m = metrics(0.5, 0.5, 0.5, 0.5);
        let overrides = ControlsOverride {
            tempo_bpm: Some(200),
            ..Default::default()
        };
        let c = map_controls(&m, &overrides);
        // Override is itself clamped to the global tempo range.
        assert_eq!(c.tempo_bpm, 180);
    }
}
