//! Port allocation policies
//!
//! A stateless choice over port metadata plus last-used history. Callers
//! fetch the active-port list and the last-used port number themselves;
//! linear history comes from the message tables (outbox for ad-hoc sends,
//! campaign messages when scoped to a campaign) while least-used reads the
//! ports' own counters.

use rand::Rng;
use smsgate_common::types::GatewayId;
use smsgate_storage::models::{GatewayPort, PortMode};

/// The chosen port for one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortChoice {
    pub port: i32,
    pub port_name: String,
    /// Owning gateway for usage attribution; None for synthetic ports
    pub gateway_id: Option<GatewayId>,
}

impl PortChoice {
    fn from_port(port: &GatewayPort) -> Self {
        Self {
            port: port.port_number,
            port_name: port.port_name.clone(),
            gateway_id: Some(port.gateway_id),
        }
    }

    fn synthetic(port: i32) -> Self {
        Self {
            port,
            port_name: format!("Port {}", port),
            gateway_id: None,
        }
    }
}

/// Port allocator over the configured policies
pub struct PortAllocator;

impl PortAllocator {
    /// Choose the port for the next send. This never fails: a pinned port
    /// is returned verbatim without validation, and an empty active set
    /// falls back to the synthetic port 1.
    pub fn next(
        mode: PortMode,
        pinned: Option<i32>,
        active: &[GatewayPort],
        last_used: Option<i32>,
    ) -> PortChoice {
        if mode == PortMode::Specific {
            return PortChoice::synthetic(pinned.unwrap_or(1));
        }

        if active.is_empty() {
            return PortChoice::synthetic(1);
        }

        match mode {
            PortMode::Random => {
                let idx = rand::thread_rng().gen_range(0..active.len());
                PortChoice::from_port(&active[idx])
            }
            PortMode::Linear => {
                // Round-robin from the last dispatched port; a last-used
                // port missing from the active set restarts the cycle
                let idx = last_used
                    .and_then(|last| active.iter().position(|p| p.port_number == last))
                    .map(|i| (i + 1) % active.len())
                    .unwrap_or(0);
                PortChoice::from_port(&active[idx])
            }
            PortMode::LeastUsed => {
                let best = active
                    .iter()
                    .min_by_key(|p| (p.messages_sent, p.last_used_at))
                    .unwrap_or(&active[0]);
                PortChoice::from_port(best)
            }
            PortMode::Specific => PortChoice::synthetic(pinned.unwrap_or(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn port(number: i32, messages_sent: i64, used_secs_ago: Option<i64>) -> GatewayPort {
        GatewayPort {
            id: Uuid::new_v4(),
            gateway_id: Uuid::new_v4(),
            port_number: number,
            port_name: format!("Port {}", number),
            sim_number: None,
            is_active: true,
            messages_sent,
            last_used_at: used_secs_ago.map(|s| Utc::now() - Duration::seconds(s)),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_specific_returns_pinned_without_validation() {
        let active = vec![port(1, 0, None)];
        let choice = PortAllocator::next(PortMode::Specific, Some(42), &active, None);
        assert_eq!(choice.port, 42);
        assert_eq!(choice.port_name, "Port 42");
    }

    #[test]
    fn test_empty_active_set_falls_back_to_port_one() {
        for mode in [PortMode::Random, PortMode::Linear, PortMode::LeastUsed] {
            let choice = PortAllocator::next(mode, None, &[], None);
            assert_eq!(choice, PortChoice::synthetic(1), "mode {}", mode);
        }
    }

    #[test]
    fn test_random_picks_an_active_port() {
        let active = vec![port(2, 0, None), port(5, 0, None), port(7, 0, None)];
        for _ in 0..50 {
            let choice = PortAllocator::next(PortMode::Random, None, &active, None);
            assert!(active.iter().any(|p| p.port_number == choice.port));
        }
    }

    #[test]
    fn test_linear_cycles_through_all_ports() {
        let active = vec![port(1, 0, None), port(3, 0, None), port(6, 0, None)];

        let mut last = None;
        let mut seen = Vec::new();
        for _ in 0..active.len() {
            let choice = PortAllocator::next(PortMode::Linear, None, &active, last);
            last = Some(choice.port);
            seen.push(choice.port);
        }

        assert_eq!(seen, vec![1, 3, 6]);

        // The cycle wraps back to the first port
        let choice = PortAllocator::next(PortMode::Linear, None, &active, last);
        assert_eq!(choice.port, 1);
    }

    #[test]
    fn test_linear_restarts_when_last_port_deactivated() {
        let active = vec![port(2, 0, None), port(4, 0, None)];
        let choice = PortAllocator::next(PortMode::Linear, None, &active, Some(9));
        assert_eq!(choice.port, 2);
    }

    #[test]
    fn test_least_used_prefers_lowest_counter() {
        let active = vec![port(1, 10, Some(5)), port(2, 3, Some(5)), port(3, 7, Some(5))];
        let choice = PortAllocator::next(PortMode::LeastUsed, None, &active, None);
        assert_eq!(choice.port, 2);
    }

    #[test]
    fn test_least_used_ties_broken_by_never_used() {
        let active = vec![port(1, 3, Some(10)), port(2, 3, None), port(3, 3, Some(600))];
        let choice = PortAllocator::next(PortMode::LeastUsed, None, &active, None);
        assert_eq!(choice.port, 2);
    }
}
