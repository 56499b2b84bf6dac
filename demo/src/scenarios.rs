//! Demo scenarios run against a live `InMemoryAuditLog`.
//!
//! Each scenario prints what it did to stdout. Decisions are synthetic:
//! a rotating set of routing and policy rules over a payload that mixes
//! retained fields with fields that must never reach the log.

use serde_json::json;
use tracing::info;

use std::sync::Arc;

use attest_audit::{AuditConfig, InMemoryAuditLog};
use attest_contracts::{
    decision::{AppendRequest, Effect},
    error::{AttestError, AttestResult},
    query::QueryFilter,
};
use attest_core::traits::{AuditLog, SystemClock};

const RULES: [(&str, Effect); 5] = [
    ("pii-block", Effect::Block),
    ("default-allow", Effect::Allow),
    ("cost-route", Effect::Route),
    ("exec-override", Effect::RequireOverride),
    ("latency-warn", Effect::WarnRoute),
];

const ORGS: [&str; 2] = ["acme", "globex"];

/// The `n`-th synthetic decision.
pub fn decision(n: usize) -> AppendRequest {
    let (rule_id, effect) = RULES[n % RULES.len()];
    AppendRequest::new(rule_id, effect)
        .org(ORGS[n % ORGS.len()])
        .actor(format!("user-{}", n % 7))
        .payload(json!({
            "model": if n % 2 == 0 { "large" } else { "small" },
            "prompt_tokens": 100 + n,
            "prompt": format!("confidential prompt #{n}"),
            "email": format!("user{n}@example.com"),
        }))
        .allow(["model", "prompt_tokens"])
}

/// Append `count` decisions, then print checkpoints and the verify report.
pub fn run(config: &AuditConfig, count: usize) -> AttestResult<()> {
    let log = InMemoryAuditLog::new(config)?;
    println!("Appending {} decisions (batch size {})", count, log.batch_size());
    for n in 0..count {
        let entry = log.append(decision(n))?;
        println!(
            "  [{:>4}] {:<16} {:<16} payload {}…  prev {}…",
            n,
            entry.rule_id,
            entry.effect,
            &entry.payload_hash[..12],
            &entry.prev_hash[..12]
        );
    }
    println!();

    print_checkpoints(&log);
    print_report(&log);
    Ok(())
}

/// Append decisions, rewrite one stored entry's effect in an exported
/// snapshot, reload it, and show that verification catches the rewrite.
pub fn tamper(config: &AuditConfig, count: usize, target: usize) -> AttestResult<()> {
    let log = populated(config, count)?;
    println!("Before tampering:");
    print_report(&log);

    let mut snapshot = log.export_snapshot();
    let Some(victim) = snapshot.entries.get_mut(target) else {
        println!("No entry at index {} to tamper with.", target);
        return Ok(());
    };
    info!(entry_id = %victim.id, "rewriting stored effect");
    let forged_effect = if victim.effect == Effect::Allow {
        Effect::Block
    } else {
        Effect::Allow
    };
    println!(
        "Rewriting entry {} ({}) effect {} -> {}",
        target, victim.id, victim.effect, forged_effect
    );
    victim.effect = forged_effect;

    let forged = InMemoryAuditLog::restore(config, Arc::new(SystemClock), snapshot)?;
    println!("After tampering:");
    print_report(&forged);
    Ok(())
}

/// Append decisions and print one sanitized page.
pub fn query(config: &AuditConfig, count: usize, filter: &QueryFilter) -> AttestResult<()> {
    let log = populated(config, count)?;

    let page = log.query(filter);
    println!("{} matching entries (limit {}, offset {}):", page.len(), filter.limit, filter.offset);
    let rendered = serde_json::to_string_pretty(&page).map_err(|e| AttestError::SnapshotError {
        reason: format!("failed to render query page: {}", e),
    })?;
    println!("{}", rendered);
    Ok(())
}

/// Append decisions, then print and check an inclusion proof for `index`.
pub fn prove(config: &AuditConfig, count: usize, index: usize) -> AttestResult<()> {
    let log = populated(config, count)?;

    match log.inclusion_proof(index) {
        Some(proof) => {
            println!("Inclusion proof for entry {}:", index);
            println!("  leaf   {}", proof.leaf_hash);
            for step in &proof.siblings {
                println!("  {:<6} {}", format!("{:?}", step.side).to_lowercase(), step.hash);
            }
            println!("  root   {}", proof.root);
            println!("  valid: {}", log.verify_inclusion(&proof));
        }
        None => println!(
            "Entry {} is not covered by a checkpoint yet ({} entries, batch size {}).",
            index,
            log.len(),
            log.batch_size()
        ),
    }
    Ok(())
}

fn print_checkpoints(log: &InMemoryAuditLog) {
    let checkpoints = log.checkpoints();
    println!("{} checkpoint(s):", checkpoints.len());
    for cp in &checkpoints {
        println!(
            "  last_index {:>4}  height {:>2}  root {}",
            cp.last_index, cp.height, cp.merkle_root
        );
    }
    println!();
}

fn print_report(log: &InMemoryAuditLog) {
    let report = log.verify();
    if report.valid {
        println!("Integrity: VALID ({} entries)", log.len());
    } else {
        println!("Integrity: INVALID");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    println!();
}

fn populated(config: &AuditConfig, count: usize) -> AttestResult<InMemoryAuditLog> {
    let log = InMemoryAuditLog::new(config)?;
    for n in 0..count {
        log.append(decision(n))?;
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_decisions_never_retain_prompt_or_email() {
        let config = AuditConfig::new("demo-test").with_batch_size(3);
        let log = populated(&config, 6).unwrap();

        for entry in log.entries() {
            assert!(!entry.redacted_payload.contains_key("prompt"));
            assert!(!entry.redacted_payload.contains_key("email"));
            assert!(entry.redacted_payload.contains_key("model"));
        }
        assert_eq!(log.checkpoints().len(), 2);
        assert!(log.verify().valid);
    }

    #[test]
    fn synthetic_decisions_cycle_through_every_effect() {
        let effects: std::collections::HashSet<Effect> =
            (0..RULES.len()).map(|n| decision(n).effect).collect();
        assert_eq!(effects.len(), 5);
    }
}
