//! Predefined laundering patterns encoding FATF narratives: placement into
//! the crypto ecosystem, layering through mixers, bridges and chain hops,
//! and integration back to fiat via exchanges.

use super::{Condition, PatternAutomaton};
use crate::graph::EntityCategory;
use crate::score::Severity;

/// All standard patterns, in library order.
pub fn standard_patterns() -> Vec<PatternAutomaton> {
    vec![
        mixer_bridge_cex(),
        rapid_mixer_chain(),
        peel_chain(),
        structuring(),
        chain_hopping(),
        sanctions_proximity(),
        darknet_cashout(),
        ransomware_laundering(),
    ]
}

/// Layering via mixer, cross-chain bridge, then cash-out via a high-risk
/// exchange, all within six hours.
fn mixer_bridge_cex() -> PatternAutomaton {
    PatternAutomaton::builder("MIXER_BRIDGE_CEX", "Mixer → Bridge → High-Risk CEX")
        .description("Layering via mixer, cross-chain bridge, then cash-out via high-risk exchange")
        .weight(85)
        .severity(Severity::High)
        .start("S0")
        .state("S1")
        .state("S2")
        .accept("ACCEPT")
        .transition(
            "S0",
            "S1",
            vec![Condition::EntityCategory(EntityCategory::Mixer)],
        )
        .transition(
            "S1",
            "S2",
            vec![
                Condition::EntityCategory(EntityCategory::Bridge),
                Condition::TimeWindowHours(4),
            ],
        )
        .transition(
            "S2",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexHighRisk),
                Condition::TimeWindowHours(6),
                Condition::HopCount(9),
            ],
        )
        .build()
        .expect("library automata validate")
}

/// Multiple mixer hops in quick succession, heavy obfuscation.
fn rapid_mixer_chain() -> PatternAutomaton {
    PatternAutomaton::builder("RAPID_MIXER_CHAIN", "Rapid Mixer Chain")
        .description("Multiple mixer hops in sequence - heavy obfuscation")
        .weight(75)
        .severity(Severity::High)
        .start("S0")
        .state("S1")
        .state("S2")
        .accept("ACCEPT")
        .transition("S0", "S1", vec![Condition::MixerHop])
        .transition(
            "S1",
            "S2",
            vec![Condition::MixerHop, Condition::TimeWindowHours(12)],
        )
        .transition(
            "S2",
            "ACCEPT",
            vec![Condition::MixerHop, Condition::TimeWindowHours(24)],
        )
        .build()
        .expect("library automata validate")
}

/// Long chain of ordinary-looking hops. The condition grammar has no
/// per-edge amount checks, so peel behaviour is encoded as chain length:
/// five consecutive clean hops inside 72 hours.
fn peel_chain() -> PatternAutomaton {
    PatternAutomaton::builder("PEEL_CHAIN", "Peel Chain")
        .description("Bitcoin peel chain - sequential small withdrawals")
        .weight(45)
        .severity(Severity::Medium)
        .start("S0")
        .state("S1")
        .state("S2")
        .state("S3")
        .state("S4")
        .accept("ACCEPT")
        .transition(
            "S0",
            "S1",
            vec![Condition::EntityCategory(EntityCategory::Clean)],
        )
        .transition(
            "S1",
            "S2",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(72),
            ],
        )
        .transition(
            "S2",
            "S3",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(72),
            ],
        )
        .transition(
            "S3",
            "S4",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(72),
            ],
        )
        .transition(
            "S4",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(72),
                Condition::HopCount(6),
            ],
        )
        .build()
        .expect("library automata validate")
}

/// Splitting through clean intermediaries before an exchange deposit,
/// everything within a day.
fn structuring() -> PatternAutomaton {
    PatternAutomaton::builder("STRUCTURING", "Structuring/Smurfing")
        .description("Multiple small transactions to avoid reporting thresholds")
        .weight(60)
        .severity(Severity::Medium)
        .start("S0")
        .state("S1")
        .accept("ACCEPT")
        .transition(
            "S0",
            "S1",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(24),
            ],
        )
        .transition(
            "S1",
            "S1",
            vec![
                Condition::EntityCategory(EntityCategory::Clean),
                Condition::TimeWindowHours(24),
            ],
        )
        .transition(
            "S1",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexHighRisk),
                Condition::TimeWindowHours(24),
                Condition::HopCount(6),
            ],
        )
        .transition(
            "S1",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexCompliant),
                Condition::TimeWindowHours(24),
                Condition::HopCount(6),
            ],
        )
        .build()
        .expect("library automata validate")
}

/// Two bridge crossings in rapid succession.
fn chain_hopping() -> PatternAutomaton {
    PatternAutomaton::builder("CHAIN_HOPPING", "Chain Hopping")
        .description("Rapid cross-chain transfers via bridges")
        .weight(55)
        .severity(Severity::Medium)
        .start("S0")
        .state("S1")
        .accept("ACCEPT")
        .transition("S0", "S1", vec![Condition::BridgeCrossing])
        .transition(
            "S1",
            "ACCEPT",
            vec![Condition::BridgeCrossing, Condition::TimeWindowHours(12)],
        )
        .build()
        .expect("library automata validate")
}

/// A sanctioned entity within two hops of the centre.
fn sanctions_proximity() -> PatternAutomaton {
    PatternAutomaton::builder("SANCTIONS_PROXIMITY", "Sanctions Proximity")
        .description("Within 2 hops of OFAC/EU sanctioned entity")
        .weight(90)
        .severity(Severity::Critical)
        .start("S0")
        .state("S1")
        .accept("ACCEPT")
        .transition(
            "S0",
            "ACCEPT",
            vec![Condition::EntityCategory(EntityCategory::Sanctioned)],
        )
        .transition("S0", "S1", vec![Condition::HopCount(1)])
        .transition(
            "S1",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::Sanctioned),
                Condition::HopCount(2),
            ],
        )
        .build()
        .expect("library automata validate")
}

/// Darknet market proceeds through a mixer and on to an exchange.
fn darknet_cashout() -> PatternAutomaton {
    PatternAutomaton::builder("DARKNET_CASHOUT", "Darknet Cash-Out")
        .description("Darknet market proceeds laundered via mixer to exchange")
        .weight(80)
        .severity(Severity::High)
        .start("S0")
        .state("S1")
        .state("S2")
        .accept("ACCEPT")
        .transition(
            "S0",
            "S1",
            vec![Condition::EntityCategory(EntityCategory::Darknet)],
        )
        .transition(
            "S1",
            "S2",
            vec![Condition::MixerHop, Condition::TimeWindowHours(48)],
        )
        .transition(
            "S2",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexHighRisk),
                Condition::TimeWindowHours(72),
            ],
        )
        .transition(
            "S2",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexCompliant),
                Condition::TimeWindowHours(72),
            ],
        )
        .build()
        .expect("library automata validate")
}

/// Ransomware proceeds through one or more mixer hops, cashed out at a
/// high-risk exchange.
fn ransomware_laundering() -> PatternAutomaton {
    PatternAutomaton::builder("RANSOMWARE_LAUNDERING", "Ransomware Laundering")
        .description("Ransomware proceeds laundered via mixers and distributed to exchanges")
        .weight(95)
        .severity(Severity::Critical)
        .start("S0")
        .state("S1")
        .state("S2")
        .accept("ACCEPT")
        .transition(
            "S0",
            "S1",
            vec![Condition::EntityCategory(EntityCategory::Ransomware)],
        )
        .transition(
            "S1",
            "S2",
            vec![Condition::MixerHop, Condition::TimeWindowHours(24)],
        )
        .transition(
            "S2",
            "S2",
            vec![Condition::MixerHop, Condition::TimeWindowHours(48)],
        )
        .transition(
            "S2",
            "ACCEPT",
            vec![
                Condition::EntityCategory(EntityCategory::CexHighRisk),
                Condition::TimeWindowHours(72),
                Condition::HopCount(8),
            ],
        )
        .build()
        .expect("library automata validate")
}
