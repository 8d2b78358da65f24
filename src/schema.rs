use rusqlite_migration::{M, Migrations};
use std::sync::LazyLock;

pub static MIGRATIONS: LazyLock<Migrations<'static>> = LazyLock::new(|| {
    Migrations::new(vec![M::up(
        "
CREATE TABLE fund (
    fund_id     TEXT PRIMARY KEY,
    short_name  TEXT,
    title_json  TEXT
);

CREATE TABLE round (
    round_id    TEXT PRIMARY KEY,
    fund_id     TEXT REFERENCES fund(fund_id),
    short_name  TEXT
);

CREATE TABLE section (
    section_id  TEXT PRIMARY KEY,
    round_id    TEXT REFERENCES round(round_id),
    index_in_round INTEGER
);

CREATE TABLE form (
    form_id             TEXT PRIMARY KEY,
    section_id          TEXT REFERENCES section(section_id),
    name_in_apply_json  TEXT,
    runner_publish_name TEXT,
    form_json           TEXT
);

CREATE INDEX idx_round_fund ON round(fund_id);
CREATE INDEX idx_section_round ON section(round_id);
CREATE INDEX idx_form_section ON form(section_id) WHERE section_id IS NOT NULL;
CREATE INDEX idx_form_pending ON form(form_id) WHERE form_json IS NULL;
",
    )])
});
