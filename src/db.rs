use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::OverviewError;
use crate::models::{MacroBundle, Nutrient, NutritionEntry, Target, TargetsSet};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    logged_at: DateTime<FixedOffset>,
    calories: Option<i32>,
    protein: Option<f64>,
    fat: Option<f64>,
    saturated_fat: Option<f64>,
    carbs: Option<f64>,
    sugar: Option<f64>,
    added_sugar: Option<f64>,
    salt: Option<f64>,
    fibre: Option<f64>,
    note: Option<String>,
    source_key: Option<String>,
}

impl CsvRow {
    fn into_entry(self) -> (NutritionEntry, Option<String>) {
        let entry = NutritionEntry {
            logged_at: self.logged_at,
            macros: MacroBundle {
                calories: self.calories.map(f64::from),
                protein: self.protein,
                fat: self.fat,
                saturated_fat: self.saturated_fat,
                carbs: self.carbs,
                sugar: self.sugar,
                added_sugar: self.added_sugar,
                salt: self.salt,
                fibre: self.fibre,
            },
            note: self.note.filter(|n| !n.trim().is_empty()),
        };
        (entry, self.source_key)
    }
}

/// Stores one entry; returns false when the source key was already imported.
async fn insert_entry(
    pool: &PgPool,
    entry: &NutritionEntry,
    source_key: &str,
) -> anyhow::Result<bool> {
    let macros = &entry.macros;
    let result = sqlx::query(
        r#"
        INSERT INTO nutrition_overview.entries
        (id, logged_at, utc_offset_seconds, calories, protein, fat, saturated_fat,
         carbs, sugar, added_sugar, salt, fibre, note, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.logged_at.with_timezone(&Utc))
    .bind(entry.logged_at.offset().local_minus_utc())
    .bind(macros.calories.map(|c| c.round() as i32))
    .bind(macros.protein)
    .bind(macros.fat)
    .bind(macros.saturated_fat)
    .bind(macros.carbs)
    .bind(macros.sugar)
    .bind(macros.added_sugar)
    .bind(macros.salt)
    .bind(macros.fibre)
    .bind(entry.note.as_deref())
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid row {}", line + 1))?;
        let (entry, source_key) = row.into_entry();
        let source_key = source_key.unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_entry(pool, &entry, &source_key).await? {
            inserted += 1;
        } else {
            warn!(%source_key, "entry already imported, skipping");
        }
    }

    Ok(inserted)
}

/// Entries whose local date is on or after `since`.
pub async fn fetch_entries(
    pool: &PgPool,
    since: NaiveDate,
) -> anyhow::Result<Vec<NutritionEntry>> {
    // Offsets reach +14h, so widen the instant window and filter on local dates.
    let lower_bound = since
        .and_hms_opt(0, 0, 0)
        .context("invalid date")?
        .and_utc()
        - Duration::days(1);

    let rows = sqlx::query(
        r#"
        SELECT logged_at, utc_offset_seconds, calories, protein, fat, saturated_fat,
               carbs, sugar, added_sugar, salt, fibre, note
        FROM nutrition_overview.entries
        WHERE logged_at >= $1
        ORDER BY logged_at
        "#,
    )
    .bind(lower_bound)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let logged_at: DateTime<Utc> = row.get("logged_at");
        let offset_seconds: i32 = row.get("utc_offset_seconds");
        let offset = FixedOffset::east_opt(offset_seconds)
            .ok_or(OverviewError::InvalidOffset(offset_seconds))?;
        let calories: Option<i32> = row.get("calories");

        let entry = NutritionEntry {
            logged_at: logged_at.with_timezone(&offset),
            macros: MacroBundle {
                calories: calories.map(f64::from),
                protein: row.get("protein"),
                fat: row.get("fat"),
                saturated_fat: row.get("saturated_fat"),
                carbs: row.get("carbs"),
                sugar: row.get("sugar"),
                added_sugar: row.get("added_sugar"),
                salt: row.get("salt"),
                fibre: row.get("fibre"),
            },
            note: row.get("note"),
        };
        if entry.local_date() >= since {
            entries.push(entry);
        }
    }

    Ok(entries)
}

pub async fn fetch_targets(pool: &PgPool) -> anyhow::Result<TargetsSet> {
    let rows = sqlx::query(
        "SELECT nutrient, enabled, min_value, max_value FROM nutrition_overview.targets",
    )
    .fetch_all(pool)
    .await?;

    let mut targets = TargetsSet::default();
    for row in rows {
        let name: String = row.get("nutrient");
        let Some(slot) = name
            .parse::<Nutrient>()
            .ok()
            .and_then(|nutrient| targets.get_mut(nutrient))
        else {
            warn!(nutrient = %name, "ignoring target for unknown nutrient");
            continue;
        };
        *slot = Target {
            enabled: row.get("enabled"),
            min: row.get("min_value"),
            max: row.get("max_value"),
        };
    }

    Ok(targets)
}

pub async fn upsert_target(
    pool: &PgPool,
    nutrient: Nutrient,
    target: &Target,
) -> anyhow::Result<()> {
    if !Nutrient::TARGETED.contains(&nutrient) {
        return Err(OverviewError::UntargetedNutrient(nutrient.to_string()).into());
    }

    sqlx::query(
        r#"
        INSERT INTO nutrition_overview.targets (nutrient, enabled, min_value, max_value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (nutrient) DO UPDATE
        SET enabled = EXCLUDED.enabled,
            min_value = EXCLUDED.min_value,
            max_value = EXCLUDED.max_value,
            updated_at = now()
        "#,
    )
    .bind(nutrient.as_str())
    .bind(target.enabled)
    .bind(target.min)
    .bind(target.max)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let targets = [
        (Nutrient::Calories, Some(2000.0), Some(2400.0)),
        (Nutrient::Protein, Some(100.0), None),
        (Nutrient::Fat, None, Some(80.0)),
        (Nutrient::SaturatedFat, None, Some(20.0)),
        (Nutrient::Carbs, Some(200.0), Some(300.0)),
        (Nutrient::Sugar, None, Some(50.0)),
        (Nutrient::Salt, None, Some(6.0)),
        (Nutrient::Fibre, Some(30.0), None),
    ];
    for (nutrient, min, max) in targets {
        upsert_target(pool, nutrient, &Target::range(min, max)).await?;
    }

    // A week in Berlin, a flight to New York, and a day back home.
    let entries = [
        (
            "seed-001",
            "2026-02-02T08:10:00+01:00",
            Some(450),
            Some(22.0),
            Some(14.0),
            Some(55.0),
            "Oats with yoghurt",
        ),
        (
            "seed-002",
            "2026-02-02T13:00:00+01:00",
            Some(820),
            Some(38.0),
            Some(30.0),
            Some(90.0),
            "Lunch bowl",
        ),
        (
            "seed-003",
            "2026-02-02T19:45:00+01:00",
            Some(900),
            Some(45.0),
            Some(35.0),
            Some(80.0),
            "Pasta",
        ),
        (
            "seed-004",
            "2026-02-03T08:00:00+01:00",
            Some(400),
            Some(20.0),
            Some(12.0),
            Some(50.0),
            "Oats",
        ),
        (
            "seed-005",
            "2026-02-03T20:30:00+01:00",
            Some(1100),
            Some(50.0),
            Some(45.0),
            Some(110.0),
            "Dinner out",
        ),
        (
            "seed-006",
            "2026-02-05T07:30:00+01:00",
            Some(350),
            None,
            None,
            None,
            "Airport pastry",
        ),
        (
            "seed-007",
            "2026-02-05T14:00:00-05:00",
            Some(700),
            Some(30.0),
            Some(25.0),
            Some(85.0),
            "In-flight meal",
        ),
        (
            "seed-008",
            "2026-02-05T21:00:00-05:00",
            Some(950),
            Some(55.0),
            Some(40.0),
            Some(70.0),
            "Burger",
        ),
        (
            "seed-009",
            "2026-02-06T09:00:00-05:00",
            None,
            None,
            None,
            None,
            "Coffee, forgot to weigh",
        ),
        (
            "seed-010",
            "2026-02-07T12:30:00-05:00",
            Some(780),
            Some(42.0),
            Some(28.0),
            Some(75.0),
            "Deli sandwich",
        ),
        (
            "seed-011",
            "2026-02-09T08:00:00+01:00",
            Some(500),
            Some(25.0),
            Some(15.0),
            Some(60.0),
            "Back home breakfast",
        ),
        (
            "seed-012",
            "2026-02-09T19:00:00+01:00",
            Some(1300),
            Some(70.0),
            Some(45.0),
            Some(120.0),
            "Big dinner",
        ),
    ];

    for (source_key, logged_at, calories, protein, fat, carbs, note) in entries {
        let entry = NutritionEntry {
            logged_at: DateTime::parse_from_rfc3339(logged_at)
                .with_context(|| format!("invalid seed timestamp {logged_at}"))?,
            macros: MacroBundle {
                calories: calories.map(|kcal: i32| f64::from(kcal)),
                protein,
                fat,
                carbs,
                ..MacroBundle::default()
            },
            note: Some(note.to_string()),
        };
        insert_entry(pool, &entry, source_key).await?;
    }

    info!(entries = entries.len(), "seed data ready");
    Ok(())
}
