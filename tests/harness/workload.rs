// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Load profiles for exercising the limiter.

/// Load profile configuration.
#[derive(Debug, Clone)]
pub struct LoadProfile {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Worker threads sharing the load
    pub workers: usize,
    /// Number of distinct clients the requests are spread over
    pub unique_clients: usize,
    /// Limiter quota per client
    pub max_requests: u32,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            total_requests: 100,
            workers: 4,
            unique_clients: 1,
            max_requests: 10,
        }
    }
}

/// Predefined load patterns.
impl LoadProfile {
    /// Many workers, one client: the quota must hold exactly.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 1_000,
            workers: 8,
            unique_clients: 1,
            max_requests: 25,
        }
    }

    /// Many clients, each staying under quota: everything is admitted.
    pub fn well_behaved_fleet() -> Self {
        Self {
            total_requests: 500,
            workers: 10,
            unique_clients: 100,
            max_requests: 10,
        }
    }

    /// Every client overshoots its quota by the same amount.
    pub fn uniform_overload() -> Self {
        Self {
            total_requests: 2_000,
            workers: 16,
            unique_clients: 50,
            max_requests: 20,
        }
    }

    /// Requests each client receives (round-robin assignment).
    pub fn requests_for_client(&self, client_index: usize) -> usize {
        let base = self.total_requests / self.unique_clients;
        let extra = usize::from(client_index < self.total_requests % self.unique_clients);
        base + extra
    }

    /// Admissions a correct limiter grants when nothing expires mid-run.
    pub fn expected_admitted(&self) -> usize {
        (0..self.unique_clients)
            .map(|i| self.requests_for_client(i).min(self.max_requests as usize))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_admitted() {
        assert_eq!(LoadProfile::single_client_flood().expected_admitted(), 25);
        assert_eq!(LoadProfile::well_behaved_fleet().expected_admitted(), 500);
        assert_eq!(LoadProfile::uniform_overload().expected_admitted(), 1_000);
    }

    #[test]
    fn test_requests_for_client_uneven_split() {
        let profile = LoadProfile {
            total_requests: 10,
            unique_clients: 3,
            ..Default::default()
        };
        assert_eq!(profile.requests_for_client(0), 4);
        assert_eq!(profile.requests_for_client(1), 3);
        assert_eq!(profile.requests_for_client(2), 3);
    }
}
