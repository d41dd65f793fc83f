mod comparison;
mod expansion;
mod fixtures;
mod rule_cases;
mod scheduling;
