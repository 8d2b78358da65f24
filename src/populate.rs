use crate::builder::{FormJsonBuilder, RunnerFormBuilder};
use crate::cli::PopulateArgs;
use crate::config::BackfillSettings;
use crate::db::open_db;
use crate::form::{FormRecord, RecordError};
use crate::session::BackfillSession;
use crate::FormfillError;
use rusqlite::Connection;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFailure {
    pub form_id: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PopulateReport {
    pub candidates: usize,
    pub updated: usize,
    pub failures: Vec<FormFailure>,
    pub committed: bool,
}

impl PopulateReport {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Name, title, build, stage for one form. Every error here is confined to this form.
fn process_form(
    session: &mut BackfillSession<'_>,
    builder: &dyn FormJsonBuilder,
    settings: &BackfillSettings,
    form: &mut FormRecord,
) -> Result<(), RecordError> {
    let name = form.display_name(settings)?;
    println!("Processing form: {} - {name}", form.form_id);

    let fund_title = match form.section_id.as_deref() {
        Some(section_id) => session.fund_title(section_id, &settings.language)?,
        None => None,
    };

    let form_json = builder.build(form, fund_title.as_deref())?;
    session.stage(&form.form_id, &form_json)?;
    form.form_json = Some(form_json);
    Ok(())
}

/// Fill `form_json` for every form that lacks it, in one transaction.
///
/// Per-form failures are counted and skipped. A failed commit rolls back
/// every form and is returned as [`FormfillError::Commit`].
pub fn populate_form_json(
    conn: &mut Connection,
    builder: &dyn FormJsonBuilder,
    settings: &BackfillSettings,
    args: &PopulateArgs,
) -> Result<PopulateReport, FormfillError> {
    println!("Starting form JSON population...");

    let mut session = BackfillSession::begin(conn)?;
    let mut forms = session.candidates()?;
    let mut report = PopulateReport {
        candidates: forms.len(),
        ..Default::default()
    };

    if forms.is_empty() {
        println!("No forms found with NULL form_json. All forms are already populated.");
        session.commit()?;
        report.committed = true;
        return Ok(report);
    }

    println!("Found {} forms with NULL form_json", forms.len());

    for form in &mut forms {
        match process_form(&mut session, builder, settings, form) {
            Ok(()) => {
                report.updated += 1;
                println!("  ✓ Generated JSON for form {}", form.form_id);
            }
            Err(e) => {
                let error = e.to_string();
                println!("  ✗ Error processing form {}: {error}", form.form_id);
                log::error!(
                    form_id = form.form_id.as_str(),
                    error = error.as_str();
                    "Failed to generate JSON for form."
                );
                report.failures.push(FormFailure {
                    form_id: form.form_id.clone(),
                    error,
                });
            }
        }
    }

    if args.dry_run {
        session.rollback()?;
        println!(
            "\nDry run — {} forms would be updated, {} failed. No changes made.",
            report.updated,
            report.error_count()
        );
        return Ok(report);
    }

    match session.commit() {
        Ok(_) => {
            report.committed = true;
            println!("\n✓ Successfully updated {} forms", report.updated);
            if report.error_count() > 0 {
                println!("✗ {} forms failed to update", report.error_count());
            }
            println!("Form JSON population completed.");
            Ok(report)
        }
        Err(e) => {
            println!("\n✗ Failed to commit changes: {e}");
            let error = e.to_string();
            log::error!(error = error.as_str(); "Failed to commit form JSON updates.");
            Err(e)
        }
    }
}

pub fn handle_populate(
    db_path: &Path,
    settings: &BackfillSettings,
    args: &PopulateArgs,
) -> Result<PopulateReport, FormfillError> {
    let mut conn = open_db(db_path)?;
    let builder = RunnerFormBuilder::new(settings.clone());
    populate_form_json(&mut conn, &builder, settings, args)
}
