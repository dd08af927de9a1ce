// Scoring engine: tiers, caps, exclusions, version lag, advisory order, global properties

mod common;

use common::{entity, zombies};
use healthscore::engine::advisory::ALL_CLEAR;
use healthscore::engine::hardware::{cpu_score, disk_score, ram_score};
use healthscore::engine::version_lag::{core_lag_penalty, lag_months, release_month};
use healthscore::evaluate;
use healthscore::models::*;

#[test]
fn all_zero_snapshot_is_fully_healthy() {
    let report = evaluate(&SystemSnapshot::default());
    assert_eq!(report.global_score, 100);
    assert_eq!(report.hardware_score, 100);
    assert_eq!(report.application_score, 100);
    assert_eq!(report.zombie_count, 0);
    assert!(report.zombie_entity_ids.is_empty());
    assert_eq!(report.log_size_mb, 0.0);
    assert_eq!(report.advisories, vec![ALL_CLEAR.to_string()]);
    assert_eq!(report.penalties, PenaltyBreakdown::default());
}

#[test]
fn healthy_but_busy_snapshot_scores_100() {
    let snapshot = SystemSnapshot {
        cpu_percent: 8.0,
        ram_percent: 55.0,
        disk_percent: 42.0,
        db_size_mb: 640.0,
        log_size_mb: Some(3.2),
        monitored_entities: vec![entity("light.kitchen", "on"), entity("sensor.temp", "21.5")],
        integration_health_states: vec![IntegrationHealth {
            id: "sensor.zha_integration_health".into(),
            state: "ok".into(),
        }],
        core_version_current: Some("2024.3.1".into()),
        core_version_latest: Some("2024.3.3".into()),
        ..Default::default()
    };
    let report = evaluate(&snapshot);
    assert_eq!(report.global_score, 100);
    assert_eq!(report.advisories, vec!["✅ System optimized".to_string()]);
    assert_eq!(report.db_size_mb, 640.0);
    assert_eq!(report.log_size_mb, 3.2);
}

#[test]
fn cpu_tiers_are_upper_bound_inclusive() {
    assert_eq!(cpu_score(0.0), 100.0);
    assert_eq!(cpu_score(10.0), 100.0);
    assert_eq!(cpu_score(10.01), 90.0);
    assert_eq!(cpu_score(15.0), 90.0);
    assert_eq!(cpu_score(15.5), 75.0);
    assert_eq!(cpu_score(25.0), 75.0);
    assert_eq!(cpu_score(50.0), 50.0);
    assert_eq!(cpu_score(51.0), 20.0);
    assert_eq!(cpu_score(100.0), 20.0);
}

#[test]
fn ram_penalty_is_linear_above_70() {
    assert_eq!(ram_score(0.0), 100.0);
    assert_eq!(ram_score(69.99), 100.0);
    assert_eq!(ram_score(70.0), 100.0);
    assert!((ram_score(80.0) - 66.7).abs() < 1e-9);
    assert!((ram_score(100.0) - 0.1).abs() < 1e-9);
}

#[test]
fn disk_penalty_is_linear_above_80() {
    assert_eq!(disk_score(79.9), 100.0);
    assert_eq!(disk_score(80.0), 100.0);
    assert_eq!(disk_score(90.0), 50.0);
    assert_eq!(disk_score(100.0), 0.0);
}

#[test]
fn hardware_average_is_truncated_and_global_is_floored() {
    let snapshot = SystemSnapshot {
        cpu_percent: 12.0,
        ram_percent: 75.0,
        ..Default::default()
    };
    let report = evaluate(&snapshot);
    // (90 + 83.35 + 100) / 3 = 91.116..; 91.116 * 0.4 + 100 * 0.6 = 96.44..
    assert_eq!(report.hardware_score, 91);
    assert_eq!(report.application_score, 100);
    assert_eq!(report.global_score, 96);
}

#[test]
fn out_of_range_percentages_use_nearest_bound() {
    let over = evaluate(&SystemSnapshot {
        cpu_percent: 250.0,
        ram_percent: 140.0,
        disk_percent: 120.0,
        ..Default::default()
    });
    let at_max = evaluate(&SystemSnapshot {
        cpu_percent: 100.0,
        ram_percent: 100.0,
        disk_percent: 100.0,
        ..Default::default()
    });
    assert_eq!(over.hardware_score, at_max.hardware_score);
    assert_eq!(over.penalties, at_max.penalties);
    assert_eq!(over.advisories[1..], at_max.advisories[1..]);

    let under = evaluate(&SystemSnapshot {
        cpu_percent: -5.0,
        ram_percent: -1.0,
        disk_percent: f64::NAN,
        db_size_mb: -20.0,
        log_size_mb: Some(f64::NAN),
        ..Default::default()
    });
    assert_eq!(under.global_score, 100);
    assert_eq!(under.db_size_mb, 0.0);
    assert_eq!(under.log_size_mb, 0.0);
}

#[test]
fn zombie_penalty_is_capped_at_20() {
    let report = evaluate(&SystemSnapshot {
        monitored_entities: zombies(15),
        ..Default::default()
    });
    assert_eq!(report.zombie_count, 15);
    assert_eq!(report.penalties.zombie, 20);
    assert_eq!(report.application_score, 80);
    assert_eq!(report.global_score, 88);
    assert_eq!(
        report.advisories,
        vec!["🧟 Hygiene: 15 Zombie Entities detected.".to_string()]
    );
}

#[test]
fn integration_health_entities_are_never_zombies() {
    let report = evaluate(&SystemSnapshot {
        monitored_entities: vec![
            entity("sensor.zwave_integration_health", "unavailable"),
            entity("binary_sensor.integration_health_mqtt", "unknown"),
        ],
        ..Default::default()
    });
    assert_eq!(report.zombie_count, 0);
    assert_eq!(report.penalties.zombie, 0);
}

#[test]
fn zombie_candidates_need_allowed_domain_exact_state_and_no_ignore() {
    let mut ignored = entity("light.garage", "unavailable");
    ignored.ignored = true;
    let report = evaluate(&SystemSnapshot {
        monitored_entities: vec![
            ignored,
            entity("automation.night_mode", "unavailable"),
            entity("update.core", "unknown"),
            entity("switch.heater", "off"),
            entity("sensor.outdoor", "Unavailable"),
            entity("camera.porch", "unknown"),
        ],
        ..Default::default()
    });
    assert_eq!(report.zombie_entity_ids, vec!["camera.porch".to_string()]);
    assert_eq!(report.penalties.zombie, 2);
}

#[test]
fn zombie_ids_keep_input_order() {
    let report = evaluate(&SystemSnapshot {
        monitored_entities: vec![
            entity("vacuum.roborock", "unavailable"),
            entity("sensor.alpha", "unknown"),
            entity("light.hall", "on"),
            entity("fan.bedroom", "unavailable"),
        ],
        ..Default::default()
    });
    assert_eq!(
        report.zombie_entity_ids,
        vec!["vacuum.roborock", "sensor.alpha", "fan.bedroom"]
    );
    assert_eq!(report.zombie_count, 3);
}

#[test]
fn failed_integrations_are_capped_at_15() {
    let health = |state: &str, n: usize| -> Vec<IntegrationHealth> {
        (0..n)
            .map(|i| IntegrationHealth {
                id: format!("sensor.i{}_integration_health", i),
                state: state.into(),
            })
            .collect()
    };
    let two = evaluate(&SystemSnapshot {
        integration_health_states: health("unhealthy", 2),
        ..Default::default()
    });
    assert_eq!(two.penalties.integration, 10);

    let mut states = health("unhealthy", 4);
    states.extend(health("ok", 3));
    let four = evaluate(&SystemSnapshot {
        integration_health_states: states,
        ..Default::default()
    });
    assert_eq!(four.penalties.integration, 15);
    assert_eq!(four.application_score, 85);
}

#[test]
fn database_tiers() {
    let penalty = |mb: f64| {
        evaluate(&SystemSnapshot {
            db_size_mb: mb,
            ..Default::default()
        })
        .penalties
        .database
    };
    assert_eq!(penalty(999.9), 0);
    assert_eq!(penalty(1000.0), 10);
    assert_eq!(penalty(2499.0), 10);
    assert_eq!(penalty(2500.0), 30);
}

#[test]
fn log_tiers_apply_only_when_monitored() {
    let report = |log: Option<f64>| {
        evaluate(&SystemSnapshot {
            log_size_mb: log,
            ..Default::default()
        })
    };
    assert_eq!(report(None).penalties.log, 0);
    assert_eq!(report(None).log_size_mb, 0.0);
    assert_eq!(report(Some(19.9)).penalties.log, 0);
    assert_eq!(report(Some(20.0)).penalties.log, 10);
    assert_eq!(report(Some(99.9)).penalties.log, 10);
    assert_eq!(report(Some(100.0)).penalties.log, 25);
}

#[test]
fn stale_backup_costs_30() {
    let report = evaluate(&SystemSnapshot {
        backup_is_stale: true,
        ..Default::default()
    });
    assert_eq!(report.penalties.backup, 30);
    assert_eq!(report.application_score, 70);
    assert_eq!(report.global_score, 82);
    assert_eq!(
        report.advisories,
        vec!["🚨 Security: Stale backup detected!".to_string()]
    );
}

#[test]
fn release_month_parsing() {
    assert_eq!(release_month("2024.3.1"), Some(2024 * 12 + 3));
    assert_eq!(release_month("2024.10"), Some(2024 * 12 + 10));
    assert_eq!(release_month("2024"), None);
    assert_eq!(release_month(""), None);
    assert_eq!(release_month("unknown"), None);
    assert_eq!(release_month("2024.x"), None);
    assert_eq!(release_month(".3"), None);
}

#[test]
fn version_lag_threshold_is_two_months() {
    assert_eq!(core_lag_penalty(Some("2024.1"), Some("2024.3")), 20);
    assert_eq!(core_lag_penalty(Some("2024.2"), Some("2024.3")), 0);
    assert_eq!(core_lag_penalty(Some("2023.12.4"), Some("2024.2.0")), 20);
    assert_eq!(core_lag_penalty(Some("2024.3.0"), Some("2024.3.2")), 0);
    // Installed ahead of latest (e.g. beta channel).
    assert_eq!(core_lag_penalty(Some("2024.6.0b1"), Some("2024.5.4")), 0);
    assert_eq!(lag_months(Some("2023.11"), Some("2024.2")), Some(3));
}

#[test]
fn malformed_versions_never_penalize() {
    for (current, latest) in [
        (Some("unknown"), Some("2024.3")),
        (Some(""), Some("2024.3")),
        (Some("2024"), Some("2025")),
        (None, Some("2024.3")),
        (Some("2020.1"), None),
        (Some("2020.1"), Some("latest.1")),
    ] {
        assert_eq!(core_lag_penalty(current, latest), 0, "{:?} -> {:?}", current, latest);
        let report = evaluate(&SystemSnapshot {
            core_version_current: current.map(str::to_string),
            core_version_latest: latest.map(str::to_string),
            ..Default::default()
        });
        assert_eq!(report.global_score, 100);
    }
}

#[test]
fn updates_and_core_lag_share_a_cap_of_35() {
    let report = evaluate(&SystemSnapshot {
        pending_update_count: 5,
        core_version_current: Some("2024.1.0".into()),
        core_version_latest: Some("2024.6.1".into()),
        ..Default::default()
    });
    assert_eq!(report.penalties.core_lag, 20);
    assert_eq!(report.penalties.updates, 35);
    assert_eq!(report.application_score, 65);
    assert_eq!(
        report.advisories,
        vec![
            "📦 Maintenance: 5 update(s) pending.".to_string(),
            "👴 Legacy: Core version is >2 months old.".to_string(),
        ]
    );

    let many = evaluate(&SystemSnapshot {
        pending_update_count: u32::MAX,
        ..Default::default()
    });
    assert_eq!(many.penalties.updates, 35);
}

#[test]
fn advisories_follow_fixed_priority_order() {
    let mut entities = zombies(3);
    entities.insert(0, entity("light.ok", "on"));
    let report = evaluate(&SystemSnapshot {
        cpu_percent: 30.0,
        backup_is_stale: true,
        monitored_entities: entities,
        ..Default::default()
    });
    assert_eq!(
        report.advisories,
        vec![
            "⚡ Optimization: CPU load is impacting score (30.0%).".to_string(),
            "🚨 Security: Stale backup detected!".to_string(),
            "🧟 Hygiene: 3 Zombie Entities detected.".to_string(),
        ]
    );
}

#[test]
fn every_advisory_triggered() {
    let snapshot = SystemSnapshot {
        cpu_percent: 60.0,
        ram_percent: 0.0,
        disk_percent: 85.0,
        db_size_mb: 2600.0,
        log_size_mb: Some(150.7),
        monitored_entities: vec![entity("media_player.tv", "unavailable")],
        integration_health_states: vec![],
        backup_is_stale: true,
        pending_update_count: 2,
        core_version_current: Some("2024.1.0".into()),
        core_version_latest: Some("2024.4.0".into()),
    };
    let report = evaluate(&snapshot);
    assert_eq!(
        report.advisories,
        vec![
            "⚡ Optimization: CPU load is impacting score (60.0%).",
            "⚠️ Disk Space: Drive full (>80%). Clean up!",
            "🗄️ Database: Huge DB (2.6 GB). Check Recorder.",
            "📜 Log File: Large Logs (150 MB). Errors detected?",
            "🚨 Security: Stale backup detected!",
            "📦 Maintenance: 2 update(s) pending.",
            "🧟 Hygiene: 1 Zombie Entities detected.",
            "👴 Legacy: Core version is >2 months old.",
        ]
    );
    // (20 + 100 + 75) / 3 = 65; application penalties exceed 100.
    assert_eq!(report.hardware_score, 65);
    assert_eq!(report.application_score, 0);
    assert_eq!(report.global_score, 26);
    assert_eq!(report.db_size_mb, 2600.0);
    assert_eq!(report.log_size_mb, 150.7);
}

#[test]
fn advisory_thresholds_differ_from_penalty_thresholds() {
    // Disk at exactly 80 costs nothing but still warns.
    let disk = evaluate(&SystemSnapshot {
        disk_percent: 80.0,
        ..Default::default()
    });
    assert_eq!(disk.hardware_score, 100);
    assert_eq!(
        disk.advisories,
        vec!["⚠️ Disk Space: Drive full (>80%). Clean up!".to_string()]
    );

    // 22 MB of logs is penalized but below the advisory threshold.
    let logs = evaluate(&SystemSnapshot {
        log_size_mb: Some(22.0),
        ..Default::default()
    });
    assert_eq!(logs.penalties.log, 10);
    assert_eq!(logs.advisories, vec![ALL_CLEAR.to_string()]);

    let db = evaluate(&SystemSnapshot {
        db_size_mb: 1000.0,
        ..Default::default()
    });
    assert_eq!(db.penalties.database, 10);
    assert_eq!(db.advisories, vec![ALL_CLEAR.to_string()]);
}

#[test]
fn sizes_are_rounded_to_one_decimal() {
    let report = evaluate(&SystemSnapshot {
        db_size_mb: 1234.56,
        log_size_mb: Some(12.34),
        ..Default::default()
    });
    assert_eq!(report.db_size_mb, 1234.6);
    assert_eq!(report.log_size_mb, 12.3);
    assert_eq!(
        report.advisories,
        vec!["🗄️ Database: Huge DB (1.2 GB). Check Recorder.".to_string()]
    );

    // Exact ties go to the even digit.
    let cases = [
        (1.45, 1.4),
        (0.25, 0.2),
        (12.25, 12.2),
        (0.15, 0.1),
        (0.35, 0.3),
        (1500.25, 1500.2),
    ];
    for (raw, expected) in cases {
        let report = evaluate(&SystemSnapshot {
            db_size_mb: raw,
            log_size_mb: Some(raw),
            ..Default::default()
        });
        assert_eq!(report.db_size_mb, expected, "db {}", raw);
        assert_eq!(report.log_size_mb, expected, "log {}", raw);
    }
}

#[test]
fn cpu_advisory_reports_raw_reading() {
    let report = evaluate(&SystemSnapshot {
        cpu_percent: 250.0,
        ..Default::default()
    });
    assert_eq!(report.penalties.cpu, 80);
    assert_eq!(
        report.advisories[0],
        "⚡ Optimization: CPU load is impacting score (250.0%)."
    );

    let nan = evaluate(&SystemSnapshot {
        cpu_percent: f64::NAN,
        ..Default::default()
    });
    assert_eq!(nan.penalties.cpu, 0);
    assert_eq!(nan.advisories, vec![ALL_CLEAR.to_string()]);
}

#[test]
fn evaluation_is_idempotent() {
    let snapshot = SystemSnapshot {
        cpu_percent: 33.3,
        ram_percent: 88.8,
        disk_percent: 91.0,
        db_size_mb: 1800.0,
        log_size_mb: Some(40.0),
        monitored_entities: zombies(4),
        backup_is_stale: true,
        pending_update_count: 1,
        ..Default::default()
    };
    let a = evaluate(&snapshot);
    let b = evaluate(&snapshot);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn scores_stay_in_range_and_never_rise_with_load() {
    let mut prev: Option<HealthReport> = None;
    for step in 0..=240 {
        let pct = f64::from(step) * 0.5;
        let report = evaluate(&SystemSnapshot {
            cpu_percent: pct,
            ram_percent: pct,
            disk_percent: pct,
            ..Default::default()
        });
        assert!(report.global_score <= 100);
        assert!(report.hardware_score <= 100);
        if let Some(p) = &prev {
            assert!(report.hardware_score <= p.hardware_score, "at {}", pct);
            assert!(report.global_score <= p.global_score, "at {}", pct);
        }
        prev = Some(report);
    }
}

#[test]
fn application_score_never_rises_with_penalty_inputs() {
    let base = SystemSnapshot::default();
    let app = |s: &SystemSnapshot| evaluate(s).application_score;

    let mut last = app(&base);
    for n in 1..30 {
        let score = app(&SystemSnapshot {
            monitored_entities: zombies(n),
            ..base.clone()
        });
        assert!(score <= last);
        last = score;
    }

    let mut last = app(&base);
    for mb in (0..40).map(|i| f64::from(i) * 100.0) {
        let score = app(&SystemSnapshot {
            db_size_mb: mb,
            log_size_mb: Some(mb / 10.0),
            ..base.clone()
        });
        assert!(score <= last);
        last = score;
    }

    let mut last = app(&base);
    for n in 0..12 {
        let score = app(&SystemSnapshot {
            pending_update_count: n,
            ..base.clone()
        });
        assert!(score <= last);
        last = score;
    }
}

#[test]
fn report_attributes_match_sensor_shape() {
    let report = evaluate(&SystemSnapshot {
        monitored_entities: vec![
            entity("light.a", "unavailable"),
            entity("switch.b", "unknown"),
        ],
        backup_is_stale: true,
        ..Default::default()
    });
    assert_eq!(
        report.recommendations(),
        "🚨 Security: Stale backup detected!\n🧟 Hygiene: 2 Zombie Entities detected."
    );
    let attrs = report.attributes();
    assert_eq!(attrs["zombie_entities"], "light.a, switch.b");
    assert_eq!(attrs["zombie_count"], 2);
    assert_eq!(attrs["application_score"], 66);

    let clear = evaluate(&SystemSnapshot::default()).attributes();
    assert_eq!(clear["zombie_entities"], "None");
    assert_eq!(clear["recommendations"], "✅ System optimized");
    assert_eq!(clear["log_size_mb"], 0.0);
}
