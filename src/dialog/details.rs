//! The `details` dialog: name → age consent → age → confirmation.

use crate::error::DialogError;
use crate::profile::{AGE_WITHHELD, Age};

use super::prompts::{PromptValue, names};
use super::step::{Dialog, StepContext, StepFn, StepOutcome, expect_confirm, expect_integer, expect_text};

/// Dialog id.
pub const DETAILS: &str = "details";

/// Index of the step that records the age; the decline branch jumps here.
const RECORD_AGE_STEP: usize = 3;

/// Build the step table.
pub fn details_dialog() -> Dialog {
    let steps: Vec<StepFn> = vec![ask_name, record_name, ask_age, record_age, finish];
    Dialog::new(DETAILS, steps)
}

fn ask_name(ctx: &mut StepContext<'_>, _: Option<PromptValue>) -> Result<StepOutcome, DialogError> {
    Ok(StepOutcome::await_input(names::TEXT, ctx.catalog.ask_name()))
}

fn record_name(ctx: &mut StepContext<'_>, value: Option<PromptValue>) -> Result<StepOutcome, DialogError> {
    let name = expect_text(value)?;
    ctx.values
        .insert("name".to_string(), serde_json::Value::String(name.clone()));
    ctx.profile.update(|p| p.name = Some(name.clone()));

    Ok(
        StepOutcome::await_input(names::CONFIRM, ctx.catalog.ask_age_consent())
            .with_message(ctx.catalog.thanks_name(&name)),
    )
}

fn ask_age(ctx: &mut StepContext<'_>, value: Option<PromptValue>) -> Result<StepOutcome, DialogError> {
    if expect_confirm(value)? {
        Ok(StepOutcome::await_input(names::INTEGER, ctx.catalog.ask_age()))
    } else {
        // Declined: record the sentinel without another round-trip.
        Ok(StepOutcome::advance(
            RECORD_AGE_STEP,
            PromptValue::Integer(AGE_WITHHELD),
        ))
    }
}

fn record_age(ctx: &mut StepContext<'_>, value: Option<PromptValue>) -> Result<StepOutcome, DialogError> {
    let age = Age::from_stored(expect_integer(value)?);
    ctx.values
        .insert("age".to_string(), serde_json::json!(age.to_stored()));
    ctx.profile.update(|p| p.set_age(age));

    let ack = match age {
        Age::Withheld => ctx.catalog.age_withheld(),
        Age::Years(n) => ctx.catalog.age_ack(n),
    };
    Ok(StepOutcome::await_input(names::CONFIRM, ctx.catalog.ask_correct()).with_message(ack))
}

fn finish(ctx: &mut StepContext<'_>, value: Option<PromptValue>) -> Result<StepOutcome, DialogError> {
    if !expect_confirm(value)? {
        ctx.profile.delete();
        return Ok(StepOutcome::end().with_message(ctx.catalog.forget()));
    }

    let profile = ctx.profile.profile();
    let name = profile.name.clone().unwrap_or_default();
    let summary = match profile.age() {
        Some(Age::Years(n)) => ctx.catalog.summary(&name, n),
        Some(Age::Withheld) | None => ctx.catalog.summary_withheld(&name),
    };
    Ok(StepOutcome::end().with_message(summary))
}
