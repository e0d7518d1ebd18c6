// Database queries: CRUD operations for classified posts and runs.
//
// Every database interaction goes through this module, so SQL stays in one
// place and the rest of the crate sees plain Rust functions.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{ExtractionRun, LabelCount, PostFilter, StoredPost};
use crate::pipeline::extract::{ClassifiedPost, ExtractionStats};
use crate::pipeline::store::StorageSummary;

// --- Classified posts ---

/// Save a classified post (upsert on id).
pub fn insert_post(conn: &Connection, post: &ClassifiedPost) -> Result<()> {
    let row = StoredPost::from_classified(post);
    let hashtags_json = serde_json::to_string(&row.hashtags)?;
    conn.execute(
        "INSERT INTO classified_posts (id, platform, author, text, cleaned_text, hashtags,
            source_context, profile, category, confidence, urgency, sentiment, risk,
            verified, criticality, latitude, longitude, posted_at, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
            datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            platform = ?2,
            author = ?3,
            text = ?4,
            cleaned_text = ?5,
            hashtags = ?6,
            source_context = ?7,
            profile = ?8,
            category = ?9,
            confidence = ?10,
            urgency = ?11,
            sentiment = ?12,
            risk = ?13,
            verified = ?14,
            criticality = ?15,
            latitude = ?16,
            longitude = ?17,
            posted_at = ?18,
            stored_at = datetime('now')",
        params![
            row.id,
            row.platform,
            row.author,
            row.text,
            row.cleaned_text,
            hashtags_json,
            row.source_context,
            row.profile,
            row.category,
            row.confidence,
            row.urgency,
            row.sentiment,
            row.risk,
            row.verified,
            row.criticality,
            row.latitude,
            row.longitude,
            row.posted_at,
        ],
    )?;
    Ok(())
}

const POST_COLUMNS: &str = "id, platform, author, text, cleaned_text, hashtags, source_context,
    profile, category, confidence, urgency, sentiment, risk, verified, criticality,
    latitude, longitude, posted_at, stored_at";

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<StoredPost> {
    let hashtags_json: String = row.get(5)?;
    Ok(StoredPost {
        id: row.get(0)?,
        platform: row.get(1)?,
        author: row.get(2)?,
        text: row.get(3)?,
        cleaned_text: row.get(4)?,
        hashtags: serde_json::from_str(&hashtags_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        source_context: row.get(6)?,
        profile: row.get(7)?,
        category: row.get(8)?,
        confidence: row.get(9)?,
        urgency: row.get(10)?,
        sentiment: row.get(11)?,
        risk: row.get(12)?,
        verified: row.get::<_, i32>(13)? != 0,
        criticality: row.get(14)?,
        latitude: row.get(15)?,
        longitude: row.get(16)?,
        posted_at: row.get(17)?,
        stored_at: row.get(18)?,
    })
}

/// List stored posts matching the filter, highest confidence first.
pub fn get_posts(conn: &Connection, filter: &PostFilter) -> Result<Vec<StoredPost>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}
         FROM classified_posts
         WHERE (?1 IS NULL OR category = ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR platform = ?2 COLLATE NOCASE)
           AND (?3 IS NULL OR confidence >= ?3)
         ORDER BY confidence DESC, stored_at DESC, id
         LIMIT ?4"
    ))?;

    // SQLite treats a negative LIMIT as "no limit"
    let limit = filter.limit.map(i64::from).unwrap_or(-1);

    let rows = stmt.query_map(
        params![filter.category, filter.platform, filter.min_confidence, limit],
        row_to_post,
    )?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

/// Look up a single stored post by id.
pub fn get_post(conn: &Connection, id: &str) -> Result<Option<StoredPost>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM classified_posts WHERE id = ?1"
    ))?;
    let post = stmt.query_row(params![id], row_to_post).optional()?;
    Ok(post)
}

pub fn post_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM classified_posts", [], |row| row.get(0))?;
    Ok(count)
}

/// Stored posts per category, most frequent first.
pub fn category_counts(conn: &Connection) -> Result<Vec<LabelCount>> {
    label_counts(conn, "category")
}

/// Stored posts per urgency level, most frequent first.
pub fn urgency_counts(conn: &Connection) -> Result<Vec<LabelCount>> {
    label_counts(conn, "urgency")
}

/// `column` is always one of our own literals, never user input.
fn label_counts(conn: &Connection, column: &str) -> Result<Vec<LabelCount>> {
    let sql = format!(
        "SELECT {column}, COUNT(*) AS n FROM classified_posts GROUP BY {column} ORDER BY n DESC, {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(LabelCount {
            label: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

// --- Extraction runs ---

/// Record a finished extraction batch and return its ID.
pub fn insert_run(
    conn: &Connection,
    profile: Option<&str>,
    stats: &ExtractionStats,
    storage: &StorageSummary,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO extraction_runs (profile, total_posts, hazard_posts, verified, stored, failed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            profile,
            stats.total_posts as i64,
            stats.hazard_posts as i64,
            stats.verified as i64,
            storage.successful as i64,
            storage.failed as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent extraction runs, newest first.
pub fn get_recent_runs(conn: &Connection, limit: u32) -> Result<Vec<ExtractionRun>> {
    let mut stmt = conn.prepare(
        "SELECT id, profile, total_posts, hazard_posts, verified, stored, failed, created_at
         FROM extraction_runs
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(ExtractionRun {
            id: row.get(0)?,
            profile: row.get(1)?,
            total_posts: row.get(2)?,
            hazard_posts: row.get(3)?,
            verified: row.get(4)?,
            stored: row.get(5)?,
            failed: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut runs = Vec::new();
    for row in rows {
        runs.push(row?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RuleTable;
    use crate::db::schema::create_tables;
    use crate::pipeline::extract::{ExtractionPipeline, GeoPoint, Platform, RawPost};

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn classify(id: &str, platform: Platform, text: &str) -> ClassifiedPost {
        let pipeline = ExtractionPipeline::new(&RuleTable::builtin()).unwrap();
        let mut raw = RawPost::new(platform, text);
        raw.id = id.to_string();
        raw.hashtags = vec!["#coast".to_string()];
        pipeline.process(raw)
    }

    #[test]
    fn test_insert_and_list_posts() {
        let conn = test_db();
        let mut tsunami = classify("t1", Platform::Twitter, "Tsunami warning, evacuation now");
        tsunami.post.location = Some(GeoPoint {
            lat: 13.0,
            lon: 80.2,
            address: Some("Marina Beach".to_string()),
        });
        insert_post(&conn, &tsunami).unwrap();
        insert_post(&conn, &classify("g1", Platform::Twitter, "Lovely sunset")).unwrap();

        let posts = get_posts(&conn, &PostFilter::default()).unwrap();
        assert_eq!(posts.len(), 2);
        // Highest confidence first
        assert_eq!(posts[0].id, "t1");
        assert_eq!(posts[0].category, "Tsunami");
        assert_eq!(posts[0].urgency, "high");
        assert_eq!(posts[0].hashtags, vec!["#coast".to_string()]);
        assert_eq!(posts[0].latitude, Some(13.0));
        assert_eq!(posts[1].category, "General");
    }

    #[test]
    fn test_insert_is_upsert() {
        let conn = test_db();
        insert_post(&conn, &classify("p1", Platform::Twitter, "quiet")).unwrap();
        insert_post(&conn, &classify("p1", Platform::Twitter, "flood on the coast road")).unwrap();
        assert_eq!(post_count(&conn).unwrap(), 1);
        let post = get_post(&conn, "p1").unwrap().unwrap();
        assert_eq!(post.category, "Flooding");
        assert!(get_post(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_filters() {
        let conn = test_db();
        insert_post(&conn, &classify("a", Platform::Twitter, "tsunami")).unwrap();
        insert_post(&conn, &classify("b", Platform::Twitter, "flood")).unwrap();
        insert_post(&conn, &classify("c", Platform::Twitter, "nothing here")).unwrap();
        insert_post(&conn, &classify("d", Platform::Reddit, "flood")).unwrap();

        let filter = PostFilter {
            category: Some("tsunami".to_string()),
            ..PostFilter::default()
        };
        let posts = get_posts(&conn, &filter).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "a");

        let filter = PostFilter {
            platform: Some("Reddit".to_string()),
            ..PostFilter::default()
        };
        let posts = get_posts(&conn, &filter).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "d");

        let filter = PostFilter {
            category: Some("Flooding".to_string()),
            platform: Some("twitter".to_string()),
            ..PostFilter::default()
        };
        let posts = get_posts(&conn, &filter).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "b");

        let filter = PostFilter {
            min_confidence: Some(0.1),
            ..PostFilter::default()
        };
        assert_eq!(get_posts(&conn, &filter).unwrap().len(), 3);

        let filter = PostFilter {
            limit: Some(1),
            ..PostFilter::default()
        };
        assert_eq!(get_posts(&conn, &filter).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_hashtags_are_an_error() {
        let conn = test_db();
        insert_post(&conn, &classify("p1", Platform::Twitter, "flood")).unwrap();
        conn.execute("UPDATE classified_posts SET hashtags = 'not json' WHERE id = 'p1'", [])
            .unwrap();

        assert!(get_post(&conn, "p1").is_err());
        assert!(get_posts(&conn, &PostFilter::default()).is_err());
    }

    #[test]
    fn test_label_counts() {
        let conn = test_db();
        insert_post(&conn, &classify("a", Platform::Twitter, "flood")).unwrap();
        insert_post(&conn, &classify("b", Platform::Twitter, "flooding again")).unwrap();
        insert_post(&conn, &classify("c", Platform::Twitter, "tsunami")).unwrap();

        let categories = category_counts(&conn).unwrap();
        assert_eq!(categories[0].label, "Flooding");
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories.iter().map(|c| c.count).sum::<i64>(), 3);

        let urgency = urgency_counts(&conn).unwrap();
        assert_eq!(urgency.iter().map(|c| c.count).sum::<i64>(), 3);
    }

    #[test]
    fn test_runs_roundtrip() {
        let conn = test_db();
        let stats = ExtractionStats {
            total_posts: 4,
            hazard_posts: 2,
            verified: 1,
            ..ExtractionStats::default()
        };
        let storage = StorageSummary {
            attempted: 4,
            successful: 3,
            failed: 1,
        };
        let first = insert_run(&conn, Some("reddit"), &stats, &storage).unwrap();
        let second = insert_run(&conn, None, &stats, &storage).unwrap();
        assert!(second > first);

        let runs = get_recent_runs(&conn, 10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[1].profile.as_deref(), Some("reddit"));
        assert_eq!(runs[1].stored, 3);
        assert_eq!(runs[1].failed, 1);
    }
}
