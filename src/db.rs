use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;

use tracing::debug;

use crate::codec;
use crate::error::{ScoringError, StoreError};
use crate::models::{
    AnswerRecord, AssessmentScore, BehavioralScores, BigFiveScores, Item, ItemOption, Module,
    ProfileDetail, RawValue, RiasecScores, ScaleType, ScoreSummary,
};
use crate::scoring::profile::Profile;
use crate::scoring::{AnswerSource, ScoreStore};

const ITEM_COLUMNS: &str = "i.item_id, i.module, i.domain, i.tags_json, i.reverse_scored, \
     i.scale_type, i.scale_min, i.scale_max, i.options_json";

const SCORE_COLUMNS: &str = "id, session_id, \
     riasec_realistic, riasec_investigative, riasec_artistic, riasec_social, \
     riasec_enterprising, riasec_conventional, holland_code, riasec_complete, \
     big_five_openness, big_five_conscientiousness, big_five_extraversion, \
     big_five_agreeableness, big_five_neuroticism, big_five_complete, \
     behavioral_motivation_type, behavioral_grit_persistence, behavioral_self_efficacy, \
     behavioral_resilience, behavioral_learning_orientation, behavioral_empathy, \
     behavioral_task_start_tempo, behavioral_complete, \
     profile_json, calculated_at, last_updated";

pub struct Database {
    conn: Connection,
}

// Item columns as stored, before the enum and JSON columns are parsed
struct ItemRow {
    item_id: String,
    module: String,
    domain: Option<String>,
    tags_json: String,
    reverse_scored: bool,
    scale_type: String,
    scale_min: f64,
    scale_max: f64,
    options_json: String,
}

impl ItemRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(0)?,
            module: row.get(1)?,
            domain: row.get(2)?,
            tags_json: row.get(3)?,
            reverse_scored: row.get(4)?,
            scale_type: row.get(5)?,
            scale_min: row.get(6)?,
            scale_max: row.get(7)?,
            options_json: row.get(8)?,
        })
    }

    fn into_item(self) -> Result<Item, StoreError> {
        let module = Module::from_str(&self.module).ok_or(StoreError::BadColumn {
            column: "module",
            value: self.module.clone(),
        })?;
        let scale_type = ScaleType::from_str(&self.scale_type).ok_or(StoreError::BadColumn {
            column: "scale_type",
            value: self.scale_type.clone(),
        })?;
        let tags: Vec<String> = serde_json::from_str(&self.tags_json)?;
        let options: Vec<ItemOption> = serde_json::from_str(&self.options_json)?;
        Ok(Item {
            item_id: self.item_id,
            module,
            domain: self.domain,
            tags,
            reverse_scored: self.reverse_scored,
            scale_type,
            scale_min: self.scale_min,
            scale_max: self.scale_max,
            options,
        })
    }
}

// Score row with its payload still encoded
fn score_from_row(row: &Row) -> rusqlite::Result<(AssessmentScore, String)> {
    let score = AssessmentScore {
        id: row.get(0)?,
        session_id: row.get(1)?,
        riasec: RiasecScores {
            realistic: row.get(2)?,
            investigative: row.get(3)?,
            artistic: row.get(4)?,
            social: row.get(5)?,
            enterprising: row.get(6)?,
            conventional: row.get(7)?,
        },
        holland_code: row.get(8)?,
        riasec_complete: row.get(9)?,
        big_five: BigFiveScores {
            openness: row.get(10)?,
            conscientiousness: row.get(11)?,
            extraversion: row.get(12)?,
            agreeableness: row.get(13)?,
            neuroticism: row.get(14)?,
        },
        big_five_complete: row.get(15)?,
        behavioral: BehavioralScores {
            motivation_type: row.get(16)?,
            grit_persistence: row.get(17)?,
            self_efficacy: row.get(18)?,
            resilience: row.get(19)?,
            learning_orientation: row.get(20)?,
            empathy: row.get(21)?,
            task_start_tempo: row.get(22)?,
        },
        behavioral_complete: row.get(23)?,
        detail: ProfileDetail::default(),
        calculated_at: row.get(25)?,
        last_updated: row.get(26)?,
    };
    Ok((score, row.get(24)?))
}

fn decode_score((mut score, payload): (AssessmentScore, String)) -> Result<AssessmentScore, StoreError> {
    score.detail = codec::decode(&payload)?;
    Ok(score)
}

// The answer's kind and content must fit the item it answers
fn check_answer(item: &Item, value: &RawValue) -> Result<(), String> {
    match (item.scale_type, value) {
        (ScaleType::Likert5, RawValue::Scalar(v)) => {
            if v.is_finite() && *v >= item.scale_min && *v <= item.scale_max {
                Ok(())
            } else {
                Err(format!(
                    "value {v} outside scale {}-{}",
                    item.scale_min, item.scale_max
                ))
            }
        }
        (ScaleType::ForcedChoice, RawValue::Selected(selected)) => {
            if selected.is_empty() {
                return Err("no option selected".to_string());
            }
            match selected.iter().find(|v| item.option(v).is_none()) {
                Some(unknown) => Err(format!("unknown option '{unknown}'")),
                None => Ok(()),
            }
        }
        (ScaleType::Ranking, RawValue::Ranked(order)) => {
            let mut given: Vec<&str> = order.iter().map(String::as_str).collect();
            let mut expected: Vec<&str> = item.options.iter().map(|o| o.value.as_str()).collect();
            given.sort_unstable();
            expected.sort_unstable();
            if given == expected {
                Ok(())
            } else {
                Err(format!("ranking must order each of {} once", expected.join(", ")))
            }
        }
        (scale, _) => Err(format!("expected a {} answer", scale.as_str())),
    }
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            -- Questionnaire catalog, kept in presentation order
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL UNIQUE,
                module TEXT NOT NULL CHECK(module IN ('riasec', 'big_five', 'behavioral')),
                domain TEXT,
                tags_json TEXT NOT NULL DEFAULT '[]',
                reverse_scored INTEGER NOT NULL DEFAULT 0,
                scale_type TEXT NOT NULL CHECK(scale_type IN ('likert_5', 'forced_choice', 'ranking')),
                scale_min REAL NOT NULL DEFAULT 1,
                scale_max REAL NOT NULL DEFAULT 5,
                options_json TEXT NOT NULL DEFAULT '[]',
                position INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                value_json TEXT NOT NULL,
                answered_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(session_id, item_id),
                FOREIGN KEY (item_id) REFERENCES items(item_id) ON DELETE CASCADE
            );

            -- One row per session; recomputation overwrites it in place
            CREATE TABLE IF NOT EXISTS assessment_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                riasec_realistic REAL,
                riasec_investigative REAL,
                riasec_artistic REAL,
                riasec_social REAL,
                riasec_enterprising REAL,
                riasec_conventional REAL,
                holland_code TEXT,
                riasec_complete INTEGER NOT NULL DEFAULT 0,
                big_five_openness REAL,
                big_five_conscientiousness REAL,
                big_five_extraversion REAL,
                big_five_agreeableness REAL,
                big_five_neuroticism REAL,
                big_five_complete INTEGER NOT NULL DEFAULT 0,
                behavioral_motivation_type REAL,
                behavioral_grit_persistence REAL,
                behavioral_self_efficacy REAL,
                behavioral_resilience REAL,
                behavioral_learning_orientation REAL,
                behavioral_empathy REAL,
                behavioral_task_start_tempo REAL,
                behavioral_complete INTEGER NOT NULL DEFAULT 0,
                profile_json TEXT NOT NULL,
                calculated_at TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_module ON items(module);
            CREATE INDEX IF NOT EXISTS idx_items_position ON items(position);
            CREATE INDEX IF NOT EXISTS idx_answers_session ON answers(session_id);
            "#,
        )?;
        Ok(())
    }

    // Item operations
    pub fn upsert_item(&self, item: &Item, position: i64) -> Result<(), StoreError> {
        let tags = serde_json::to_string(&item.tags)?;
        let options = serde_json::to_string(&item.options)?;
        self.conn.execute(
            r#"
            INSERT INTO items (item_id, module, domain, tags_json, reverse_scored,
                               scale_type, scale_min, scale_max, options_json, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(item_id) DO UPDATE SET
                module = excluded.module,
                domain = excluded.domain,
                tags_json = excluded.tags_json,
                reverse_scored = excluded.reverse_scored,
                scale_type = excluded.scale_type,
                scale_min = excluded.scale_min,
                scale_max = excluded.scale_max,
                options_json = excluded.options_json,
                position = excluded.position
            "#,
            params![
                item.item_id,
                item.module.as_str(),
                item.domain,
                tags,
                item.reverse_scored,
                item.scale_type.as_str(),
                item.scale_min,
                item.scale_max,
                options,
                position,
            ],
        )?;
        Ok(())
    }

    /// Upsert a whole catalog in one transaction, positions following slice order.
    pub fn seed_items(&self, items: &[Item]) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for (position, item) in items.iter().enumerate() {
            self.upsert_item(item, position as i64)?;
        }
        tx.commit()?;
        debug!(items = items.len(), "catalog seeded");
        Ok(items.len())
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.item_id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![item_id], ItemRow::from_row);

        match row {
            Ok(r) => Ok(Some(r.into_item()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_items(&self, module: Option<Module>) -> Result<Vec<Item>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i \
             WHERE (?1 IS NULL OR i.module = ?1) \
             ORDER BY i.position, i.item_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![module.map(|m| m.as_str())], ItemRow::from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(ItemRow::into_item)
            .collect()
    }

    // Answer operations
    pub fn save_answer(
        &self,
        session_id: &str,
        item_id: &str,
        value: &RawValue,
    ) -> Result<(), StoreError> {
        let item = self
            .get_item(item_id)?
            .ok_or_else(|| StoreError::UnknownItem(item_id.to_string()))?;
        check_answer(&item, value).map_err(|reason| StoreError::InvalidAnswer {
            item_id: item_id.to_string(),
            reason,
        })?;

        let value_json = serde_json::to_string(value)?;
        self.conn.execute(
            r#"
            INSERT INTO answers (session_id, item_id, value_json, answered_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(session_id, item_id) DO UPDATE SET
                value_json = excluded.value_json,
                answered_at = excluded.answered_at
            "#,
            params![session_id, item_id, value_json, Utc::now().to_rfc3339()],
        )?;
        debug!(session_id, item_id, "answer saved");
        Ok(())
    }

    // Score operations
    pub fn list_scores(&self) -> Result<Vec<ScoreSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, holland_code, riasec_complete, big_five_complete,
                   behavioral_complete, last_updated
            FROM assessment_scores
            ORDER BY last_updated DESC, session_id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ScoreSummary {
                session_id: row.get(0)?,
                holland_code: row.get(1)?,
                riasec_complete: row.get(2)?,
                big_five_complete: row.get(3)?,
                behavioral_complete: row.get(4)?,
                last_updated: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl AnswerSource for Database {
    fn get_answers(&self, session_id: &str) -> Result<Vec<AnswerRecord>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS}, a.value_json \
             FROM items i \
             LEFT JOIN answers a ON a.item_id = i.item_id AND a.session_id = ?1 \
             ORDER BY i.position, i.item_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((ItemRow::from_row(row)?, row.get::<_, Option<String>>(9)?))
        })?;

        let mut answers = Vec::new();
        for row in rows {
            let (item, value_json) = row?;
            let value = match value_json {
                Some(json) => Some(serde_json::from_str::<RawValue>(&json)?),
                None => None,
            };
            answers.push(AnswerRecord {
                item: item.into_item()?,
                value,
            });
        }
        Ok(answers)
    }
}

// Upsert and re-select on a connection the caller holds a transaction on
fn write_score(
    conn: &Connection,
    session_id: &str,
    profile: &Profile,
) -> Result<(AssessmentScore, String), StoreError> {
    let payload = codec::encode(&profile.detail)?;
    let now = Utc::now().to_rfc3339();
    let (r, b, h) = (&profile.riasec, &profile.big_five, &profile.behavioral);

    conn.execute(
        r#"
        INSERT INTO assessment_scores (
            session_id,
            riasec_realistic, riasec_investigative, riasec_artistic, riasec_social,
            riasec_enterprising, riasec_conventional, holland_code, riasec_complete,
            big_five_openness, big_five_conscientiousness, big_five_extraversion,
            big_five_agreeableness, big_five_neuroticism, big_five_complete,
            behavioral_motivation_type, behavioral_grit_persistence, behavioral_self_efficacy,
            behavioral_resilience, behavioral_learning_orientation, behavioral_empathy,
            behavioral_task_start_tempo, behavioral_complete,
            profile_json, calculated_at, last_updated
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?25)
        ON CONFLICT(session_id) DO UPDATE SET
            riasec_realistic = excluded.riasec_realistic,
            riasec_investigative = excluded.riasec_investigative,
            riasec_artistic = excluded.riasec_artistic,
            riasec_social = excluded.riasec_social,
            riasec_enterprising = excluded.riasec_enterprising,
            riasec_conventional = excluded.riasec_conventional,
            holland_code = excluded.holland_code,
            riasec_complete = excluded.riasec_complete,
            big_five_openness = excluded.big_five_openness,
            big_five_conscientiousness = excluded.big_five_conscientiousness,
            big_five_extraversion = excluded.big_five_extraversion,
            big_five_agreeableness = excluded.big_five_agreeableness,
            big_five_neuroticism = excluded.big_five_neuroticism,
            big_five_complete = excluded.big_five_complete,
            behavioral_motivation_type = excluded.behavioral_motivation_type,
            behavioral_grit_persistence = excluded.behavioral_grit_persistence,
            behavioral_self_efficacy = excluded.behavioral_self_efficacy,
            behavioral_resilience = excluded.behavioral_resilience,
            behavioral_learning_orientation = excluded.behavioral_learning_orientation,
            behavioral_empathy = excluded.behavioral_empathy,
            behavioral_task_start_tempo = excluded.behavioral_task_start_tempo,
            behavioral_complete = excluded.behavioral_complete,
            profile_json = excluded.profile_json,
            last_updated = excluded.last_updated
        "#,
        params![
            session_id,
            r.realistic,
            r.investigative,
            r.artistic,
            r.social,
            r.enterprising,
            r.conventional,
            profile.holland_code.map(|c| c.to_string()),
            profile.completion.riasec,
            b.openness,
            b.conscientiousness,
            b.extraversion,
            b.agreeableness,
            b.neuroticism,
            profile.completion.big_five,
            h.motivation_type,
            h.grit_persistence,
            h.self_efficacy,
            h.resilience,
            h.learning_orientation,
            h.empathy,
            h.task_start_tempo,
            profile.completion.behavioral,
            payload,
            now,
        ],
    )?;
    let sql = format!("SELECT {SCORE_COLUMNS} FROM assessment_scores WHERE session_id = ?1");
    Ok(conn.query_row(&sql, params![session_id], score_from_row)?)
}

impl ScoreStore for Database {
    fn upsert_score(
        &self,
        session_id: &str,
        profile: &Profile,
    ) -> Result<AssessmentScore, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let row = write_score(&tx, session_id, profile)?;
        tx.commit()?;

        decode_score(row)
    }

    // IMMEDIATE takes the write lock before the answers are read, so no
    // other writer can change them until the score commits
    fn save_with<F>(&self, session_id: &str, compute: F) -> Result<AssessmentScore, ScoringError>
    where
        F: FnOnce() -> Result<Profile, ScoringError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let profile = compute()?;
        let row = write_score(&tx, session_id, &profile)?;
        tx.commit().map_err(StoreError::from)?;

        debug!(session_id, "score unit committed");
        Ok(decode_score(row)?)
    }

    fn get_score(&self, session_id: &str) -> Result<Option<AssessmentScore>, StoreError> {
        let sql = format!("SELECT {SCORE_COLUMNS} FROM assessment_scores WHERE session_id = ?1");
        let row = self.conn.query_row(&sql, params![session_id], score_from_row);

        match row {
            Ok(r) => Ok(Some(decode_score(r)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
