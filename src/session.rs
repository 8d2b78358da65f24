use crate::form::{FormRecord, RecordError, localized_title};
use crate::FormfillError;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde_json::Value;

const FUND_TITLE_SQL: &str = "
    SELECT f.title_json
    FROM fund f
    JOIN round r ON f.fund_id = r.fund_id
    JOIN section s ON r.round_id = s.round_id
    WHERE s.section_id = ?1";

/// The single write transaction a backfill run holds.
///
/// Opened IMMEDIATE so the write lock is taken before candidates are read;
/// a second run blocks (up to busy_timeout) instead of selecting the same rows.
/// Writes are staged in memory and only reach the table in [`commit`](Self::commit).
/// Dropping the session without committing rolls back.
pub struct BackfillSession<'c> {
    tx: Transaction<'c>,
    staged: Vec<(String, String)>,
}

impl<'c> BackfillSession<'c> {
    pub fn begin(conn: &'c mut Connection) -> Result<Self, FormfillError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self {
            tx,
            staged: Vec::new(),
        })
    }

    /// Forms whose `form_json` is unset, in rowid order.
    pub fn candidates(&self) -> Result<Vec<FormRecord>, FormfillError> {
        let mut stmt = self.tx.prepare(
            "SELECT form_id, name_in_apply_json, section_id, runner_publish_name
             FROM form WHERE form_json IS NULL ORDER BY rowid",
        )?;
        let forms = stmt
            .query_map([], |r| {
                Ok(FormRecord {
                    form_id: r.get(0)?,
                    name_in_apply_json: r.get(1)?,
                    section_id: r.get(2)?,
                    runner_publish_name: r.get(3)?,
                    form_json: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(forms)
    }

    /// Fund title for a section via section → round → fund.
    /// A missing link anywhere in the chain is `None`.
    pub fn fund_title(
        &self,
        section_id: &str,
        language: &str,
    ) -> Result<Option<String>, RecordError> {
        let mut stmt = self.tx.prepare_cached(FUND_TITLE_SQL)?;
        let raw: Option<Option<String>> = stmt
            .query_row(params![section_id], |r| r.get(0))
            .optional()?;
        localized_title(raw.flatten().as_deref(), language)
    }

    pub fn stage(&mut self, form_id: &str, form_json: &Value) -> Result<(), RecordError> {
        let text = serde_json::to_string(form_json)?;
        self.staged.push((form_id.to_string(), text));
        Ok(())
    }

    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    /// Write every staged value and commit. Any failure rolls everything back.
    pub fn commit(self) -> Result<usize, FormfillError> {
        let Self { tx, staged } = self;

        if let Err(e) = flush(&tx, &staged) {
            if let Err(rb) = tx.rollback() {
                log::error!("rollback after failed flush: {rb}");
            }
            return Err(FormfillError::Commit(e));
        }

        // A failed COMMIT leaves the transaction open; dropping it rolls back.
        tx.commit().map_err(FormfillError::Commit)?;
        Ok(staged.len())
    }

    pub fn rollback(self) -> Result<(), FormfillError> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn flush(tx: &Transaction<'_>, staged: &[(String, String)]) -> rusqlite::Result<()> {
    let mut update = tx.prepare_cached(
        "UPDATE form SET form_json = ?1 WHERE form_id = ?2 AND form_json IS NULL",
    )?;
    for (form_id, json) in staged {
        update.execute(params![json, form_id])?;
    }
    Ok(())
}
