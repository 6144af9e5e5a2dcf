//! Cross-rater measurement uncertainty.
//!
//! Within a consensus group every contributor observes the Level the group
//! assigns to each of its members. Comparing what one contributor observed
//! about a member with what that member observed about themselves gives a
//! per-contributor bias (nominal) and spread (standard deviation).

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::debug;

use fractal_core::dataset::Dataset;
use fractal_core::statistics::{mean, population_std_dev};
use fractal_core::types::{AttendanceTable, MeetingId, MemberId};
use fractal_core::Uncertain;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Measurement {
    member_id: MemberId,
    level: u32,
    meeting_id: MeetingId,
    group: u32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MeasurementLeaderBoardEntry {
    pub member_id: MemberId,
    /// Mean difference between this contributor's and the members' own view.
    pub measurement_bias: f64,
    /// Standard deviation of that difference; the ranking key.
    pub measurement_uncertainty: f64,
    pub accumulated_level: u64,
    pub accumulated_respect: f64,
    pub attendance_count: usize,
}

/// Per-contributor statistics of the Levels observed for each member.
#[derive(Clone, Debug)]
pub struct MeasurementUncertaintyEstimator {
    // contributor -> observed member -> (mean, population std) of the Levels
    statistics: BTreeMap<MemberId, BTreeMap<MemberId, Uncertain>>,
}

impl MeasurementUncertaintyEstimator {
    pub fn from_table(table: &AttendanceTable) -> Self {
        let mut groups: BTreeMap<(MeetingId, u32), Vec<(&MemberId, u32)>> = BTreeMap::new();
        for record in table.attended_records() {
            if let (Some(level), Some(group)) = (record.level, record.group) {
                groups
                    .entry((record.meeting_id, group))
                    .or_default()
                    .push((&record.member_id, level));
            }
        }

        let mut observed: BTreeMap<MemberId, BTreeMap<MemberId, BTreeSet<Measurement>>> =
            BTreeMap::new();
        for ((meeting_id, group), members) in &groups {
            for (contributor, _) in members {
                let by_member = observed.entry((*contributor).clone()).or_default();
                for (member_id, level) in members {
                    by_member
                        .entry((*member_id).clone())
                        .or_default()
                        .insert(Measurement {
                            member_id: (*member_id).clone(),
                            level: *level,
                            meeting_id: *meeting_id,
                            group: *group,
                        });
                }
            }
        }

        // Each statistic is its own independent variable, shared by every
        // comparison that uses it.
        let statistics = observed
            .into_iter()
            .map(|(contributor, by_member)| {
                let stats = by_member
                    .into_iter()
                    .map(|(member_id, measurements)| {
                        let levels: Vec<f64> =
                            measurements.iter().map(|m| f64::from(m.level)).collect();
                        let value = Uncertain::new(
                            mean(&levels).unwrap_or(0.0),
                            population_std_dev(&levels).unwrap_or(0.0),
                        );
                        (member_id, value)
                    })
                    .collect();
                (contributor, stats)
            })
            .collect::<BTreeMap<_, _>>();
        debug!(contributors = statistics.len(), "measurement statistics");

        Self { statistics }
    }

    /// What `contributor` observed about `member_id`.
    pub fn statistics(&self, contributor: &MemberId, member_id: &MemberId) -> Option<&Uncertain> {
        self.statistics.get(contributor)?.get(member_id)
    }

    /// Mean over observed members of (contributor's view - member's own
    /// view). Contributors without any comparison are omitted.
    pub fn measurement_uncertainty(&self, include_self: bool) -> BTreeMap<MemberId, Uncertain> {
        let mut result = BTreeMap::new();
        for (contributor, by_member) in &self.statistics {
            let differences: Vec<Uncertain> = by_member
                .iter()
                .filter(|(member_id, _)| include_self || *member_id != contributor)
                .filter_map(|(member_id, view)| {
                    let own = self.statistics(member_id, member_id)?;
                    Some(view - own)
                })
                .collect();
            if let Some(uncertainty) = Uncertain::mean(&differences) {
                result.insert(contributor.clone(), uncertainty);
            }
        }
        result
    }

    /// Contributors ranked by |uncertainty| asc, accumulated Level desc,
    /// attendance count desc, member id asc.
    pub fn leader_board(
        &self,
        dataset: &Dataset,
        include_self: bool,
    ) -> Vec<MeasurementLeaderBoardEntry> {
        let mut board: Vec<MeasurementLeaderBoardEntry> = self
            .measurement_uncertainty(include_self)
            .into_iter()
            .map(|(member_id, uncertainty)| {
                let summary = dataset.member_summary(&member_id);
                MeasurementLeaderBoardEntry {
                    measurement_bias: uncertainty.nominal(),
                    measurement_uncertainty: uncertainty.std_dev(),
                    accumulated_level: summary.map_or(0, |s| s.accumulated_level),
                    accumulated_respect: summary.map_or(0.0, |s| s.accumulated_respect),
                    attendance_count: summary.map_or(0, |s| s.attendance_count),
                    member_id,
                }
            })
            .collect();
        board.sort_by(|a, b| {
            OrderedFloat(a.measurement_uncertainty.abs())
                .cmp(&OrderedFloat(b.measurement_uncertainty.abs()))
                .then(Reverse(a.accumulated_level).cmp(&Reverse(b.accumulated_level)))
                .then(Reverse(a.attendance_count).cmp(&Reverse(b.attendance_count)))
                .then(a.member_id.cmp(&b.member_id))
        });
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_core::types::AttendanceRecord;

    fn record(member: &str, meeting_id: MeetingId, group: u32, level: u32) -> AttendanceRecord {
        AttendanceRecord {
            member_id: member.into(),
            meeting_id,
            level: Some(level),
            group: Some(group),
            team_id: None,
            signature_on_file: true,
        }
    }

    fn table() -> AttendanceTable {
        AttendanceTable::new(vec![
            record("a", 1, 1, 6),
            record("b", 1, 1, 5),
            record("a", 2, 1, 5),
            record("c", 2, 1, 6),
            record("b", 3, 1, 6),
            record("c", 3, 1, 5),
            record("d", 4, 2, 3),
        ])
        .unwrap()
    }

    #[test]
    fn contributor_statistics() {
        let estimator = MeasurementUncertaintyEstimator::from_table(&table());
        let a = MemberId::from("a");
        let own = estimator.statistics(&a, &a).unwrap();
        assert_eq!(own.nominal(), 5.5);
        assert!((own.std_dev() - 0.5).abs() < 1e-12);
        let seen_by_b = estimator.statistics(&"b".into(), &a).unwrap();
        assert_eq!(seen_by_b.nominal(), 6.0);
        assert!(seen_by_b.is_exact());
        assert!(estimator.statistics(&"d".into(), &a).is_none());
    }

    #[test]
    fn uncertainty_without_self_measurements() {
        let estimator = MeasurementUncertaintyEstimator::from_table(&table());
        let result = estimator.measurement_uncertainty(false);
        let a = &result[&MemberId::from("a")];
        assert!(a.nominal().abs() < 1e-12);
        assert!((a.std_dev() - 0.125f64.sqrt()).abs() < 1e-12);
        // d only ever observed itself.
        assert!(!result.contains_key(&MemberId::from("d")));
    }

    #[test]
    fn self_comparison_is_exactly_zero() {
        let estimator = MeasurementUncertaintyEstimator::from_table(&table());
        let result = estimator.measurement_uncertainty(true);
        assert!(result[&MemberId::from("d")].is_exact());
        let a = &result[&MemberId::from("a")];
        assert!((a.std_dev() - 0.5f64.sqrt() / 3.0).abs() < 1e-12);
    }

    #[test]
    fn leader_board_order() {
        let table = table();
        let dataset = Dataset::from_table(&table).unwrap();
        let estimator = MeasurementUncertaintyEstimator::from_table(&table);

        let with_self: Vec<String> = estimator
            .leader_board(&dataset, true)
            .into_iter()
            .map(|e| e.member_id.to_string())
            .collect();
        assert_eq!(with_self, vec!["d", "a", "b", "c"]);

        let without_self = estimator.leader_board(&dataset, false);
        assert_eq!(without_self.len(), 3);
        assert_eq!(without_self[0].accumulated_level, 11);
        assert_eq!(without_self[0].attendance_count, 2);
    }
}
