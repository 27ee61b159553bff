use anyhow::Result;
use privlens_engine::Inspector;
use privlens_security::PatternRule;

pub fn handle(inspector: &Inspector) -> Result<()> {
    let registry = inspector.registry();

    println!("Detection rules ({}, in evaluation order):", registry.len());
    for rule in registry.rules() {
        println!(
            "  {:<18} weight {:>4.2}  {}",
            rule.name,
            rule.severity_weight,
            notes(rule).join(", ")
        );
    }

    println!("Decoders: {}", inspector.decoders().names().join(", "));
    Ok(())
}

fn notes(rule: &PatternRule) -> Vec<&'static str> {
    let mut notes = Vec::new();
    if rule.validator.is_some() {
        notes.push("validated");
    }
    if rule.uses_capture_group {
        notes.push("capture group");
    }
    notes
}
