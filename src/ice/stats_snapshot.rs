use super::candidate_pair::{
    CandidatePairState, CandidatePairStats, CandidateStats, SelectedCandidatePair,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsReport {
    CandidatePair(CandidatePairStats),
    LocalCandidate(CandidateStats),
    RemoteCandidate(CandidateStats),
}

/// Point-in-time statistics returned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    reports: Vec<StatsReport>,
}

impl StatsSnapshot {
    #[must_use]
    pub fn new(reports: Vec<StatsReport>) -> Self {
        Self { reports }
    }

    #[must_use]
    pub fn reports(&self) -> &[StatsReport] {
        &self.reports
    }

    pub fn candidate_pairs(&self) -> impl Iterator<Item = &CandidatePairStats> + '_ {
        self.reports.iter().filter_map(|r| match r {
            StatsReport::CandidatePair(p) => Some(p),
            _ => None,
        })
    }

    #[must_use]
    pub fn local_candidate(&self, id: &str) -> Option<&CandidateStats> {
        self.reports.iter().find_map(|r| match r {
            StatsReport::LocalCandidate(c) if c.id == id => Some(c),
            _ => None,
        })
    }

    #[must_use]
    pub fn remote_candidate(&self, id: &str) -> Option<&CandidateStats> {
        self.reports.iter().find_map(|r| match r {
            StatsReport::RemoteCandidate(c) if c.id == id => Some(c),
            _ => None,
        })
    }

    /// The succeeded pair, nominated ones first, resolved against the
    /// snapshot's candidate entries.
    #[must_use]
    pub fn succeeded_pair(&self) -> Option<SelectedCandidatePair> {
        let succeeded = || {
            self.candidate_pairs()
                .filter(|p| p.state == CandidatePairState::Succeeded)
        };
        let pair = succeeded()
            .find(|p| p.nominated)
            .or_else(|| succeeded().next())?;

        Some(SelectedCandidatePair {
            pair_id: pair.id.clone(),
            local_candidate_id: pair.local_candidate_id.clone(),
            remote_candidate_id: pair.remote_candidate_id.clone(),
            local: self.local_candidate(&pair.local_candidate_id).cloned(),
            remote: self.remote_candidate(&pair.remote_candidate_id).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::ice::candidate_type::CandidateType;

    fn cand(id: &str, address: &str) -> CandidateStats {
        CandidateStats {
            id: id.into(),
            address: address.into(),
            port: 5000,
            protocol: "udp".into(),
            candidate_type: CandidateType::Host,
        }
    }

    fn pair(id: &str, l: &str, r: &str, state: CandidatePairState, nominated: bool) -> StatsReport {
        StatsReport::CandidatePair(CandidatePairStats {
            id: id.into(),
            local_candidate_id: l.into(),
            remote_candidate_id: r.into(),
            state,
            nominated,
        })
    }

    #[test]
    fn prefers_nominated_succeeded_pair() {
        let snap = StatsSnapshot::new(vec![
            pair("P1", "L1", "R1", CandidatePairState::Succeeded, false),
            pair("P2", "L2", "R1", CandidatePairState::Succeeded, true),
            StatsReport::LocalCandidate(cand("L1", "10.0.0.1")),
            StatsReport::LocalCandidate(cand("L2", "10.0.0.2")),
            StatsReport::RemoteCandidate(cand("R1", "10.0.0.9")),
        ]);
        let sel = snap.succeeded_pair().unwrap();
        assert_eq!(sel.pair_id, "P2");
        assert_eq!(sel.local.unwrap().address, "10.0.0.2");
        assert_eq!(sel.remote.unwrap().address, "10.0.0.9");
    }

    #[test]
    fn missing_candidate_entries_stay_unresolved() {
        let snap = StatsSnapshot::new(vec![pair(
            "P1",
            "L1",
            "R1",
            CandidatePairState::Succeeded,
            false,
        )]);
        let sel = snap.succeeded_pair().unwrap();
        assert_eq!(sel.local_candidate_id, "L1");
        assert!(sel.local.is_none());
        assert!(sel.remote.is_none());
    }

    #[test]
    fn no_pair_when_none_succeeded() {
        let snap = StatsSnapshot::new(vec![
            pair("P1", "L1", "R1", CandidatePairState::InProgress, false),
            pair("P2", "L1", "R2", CandidatePairState::Failed, true),
        ]);
        assert!(snap.succeeded_pair().is_none());
        assert!(StatsSnapshot::default().succeeded_pair().is_none());
    }
}
