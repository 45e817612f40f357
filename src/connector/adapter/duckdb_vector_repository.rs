use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::VectorRepository;
use crate::domain::{
    ensure_dimensions, validate_collection_name, CodeChunk, CollectionHandle, CollectionInfo,
    CollectionKind, DomainError, Language, NodeType, SearchResult, SourceSpan,
};

/// Durable vector store backed by a DuckDB file.
///
/// Every collection gets its own schema holding a single `chunks` table with
/// a fixed-width `FLOAT[N]` vector column. A `collections` registry in the main
/// schema records names and kinds. Lookups are exact: `array_distance` over the
/// whole collection, no approximate index.
pub struct DuckdbVectorRepository {
    conn: Arc<Mutex<Connection>>,
    dimensions: usize,
}

impl DuckdbVectorRepository {
    /// Opens (or creates) the database at `path`. Ephemeral collections left
    /// behind by a previous process are dropped here.
    pub fn open(path: &Path, dimensions: usize) -> Result<Self, DomainError> {
        let mut conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize(&conn)?;

        let purged = Self::purge_ephemeral(&mut conn)?;
        if purged > 0 {
            info!("Dropped {} stale ephemeral collection(s)", purged);
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        })
    }

    pub fn in_memory(dimensions: usize) -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                created_at BIGINT NOT NULL
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to create collections table: {}", e)))?;
        debug!("Collections registry ready");
        Ok(())
    }

    /// Schema names are prefixed so a collection can never shadow `main`.
    fn schema_name(collection: &str) -> String {
        format!("coll_{}", collection)
    }

    fn purge_ephemeral(conn: &mut Connection) -> Result<usize, DomainError> {
        let names = {
            let mut stmt = conn
                .prepare("SELECT name FROM collections WHERE kind = ?")
                .map_err(|e| DomainError::storage(format!("Failed to prepare purge: {}", e)))?;
            let rows = stmt
                .query_map(params![CollectionKind::Ephemeral.as_str()], |row| {
                    row.get::<_, String>(0)
                })
                .map_err(|e| DomainError::storage(format!("Failed to list ephemeral: {}", e)))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        };

        for name in &names {
            Self::drop_schema(conn, name)?;
        }
        Ok(names.len())
    }

    /// Schema and registry row go together or not at all.
    fn drop_schema(conn: &mut Connection, name: &str) -> Result<(), DomainError> {
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;
        tx.execute_batch(&format!(
            "DROP SCHEMA IF EXISTS \"{}\" CASCADE;",
            Self::schema_name(name)
        ))
        .map_err(|e| DomainError::storage(format!("Failed to drop collection {}: {}", name, e)))?;
        tx.execute("DELETE FROM collections WHERE name = ?", params![name])
            .map_err(|e| {
                DomainError::storage(format!("Failed to unregister collection {}: {}", name, e))
            })?;
        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;
        Ok(())
    }

    /// Kind and vector width recorded for `name`, if registered.
    fn registration(
        conn: &Connection,
        name: &str,
    ) -> Result<Option<(CollectionKind, usize)>, DomainError> {
        let mut stmt = conn
            .prepare("SELECT kind, dimensions FROM collections WHERE name = ?")
            .map_err(|e| DomainError::storage(format!("Failed to prepare lookup: {}", e)))?;
        let mut rows = stmt
            .query(params![name])
            .map_err(|e| DomainError::storage(format!("Failed to look up collection: {}", e)))?;

        match rows
            .next()
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        {
            Some(row) => {
                let kind: String = row
                    .get(0)
                    .map_err(|e| DomainError::storage(format!("Failed to read kind: {}", e)))?;
                let dimensions: i64 = row.get(1).map_err(|e| {
                    DomainError::storage(format!("Failed to read dimensions: {}", e))
                })?;
                Ok(Some((CollectionKind::parse(&kind)?, dimensions as usize)))
            }
            None => Ok(None),
        }
    }

    fn require_collection(conn: &Connection, handle: &CollectionHandle) -> Result<(), DomainError> {
        match Self::registration(conn, handle.name())? {
            Some(_) => Ok(()),
            None => Err(DomainError::collection_not_found(handle.name().to_string())),
        }
    }

    fn count_rows(conn: &Connection, name: &str) -> Result<u64, DomainError> {
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM \"{}\".chunks", Self::schema_name(name)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count chunks: {}", e)))?;
        Ok(count as u64)
    }

    /// Next free position; ids are derived from it, so deletes never cause reuse.
    fn next_position(conn: &Connection, name: &str) -> Result<u64, DomainError> {
        let next: i64 = conn
            .query_row(
                &format!(
                    "SELECT COALESCE(MAX(position) + 1, 0) FROM \"{}\".chunks",
                    Self::schema_name(name)
                ),
                [],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to read next position: {}", e)))?;
        Ok(next as u64)
    }

    fn vector_to_array_literal(&self, vector: &[f32]) -> Result<String, DomainError> {
        ensure_dimensions(vector, self.dimensions)?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::invalid_input(
                "Embedding contains non-finite components",
            ));
        }
        let mut s = String::with_capacity(vector.len() * 8);
        s.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&format!("{}", v));
        }
        s.push(']');
        s.push_str(&format!("::FLOAT[{}]", self.dimensions));
        Ok(s)
    }

    fn row_to_result(row: &Row<'_>) -> Result<SearchResult, DomainError> {
        let read = |e: duckdb::Error, column: &str| {
            DomainError::storage(format!("Failed to read {}: {}", column, e))
        };

        let span = SourceSpan::new(
            row.get::<_, i64>(4).map_err(|e| read(e, "start_byte"))? as usize,
            row.get::<_, i64>(5).map_err(|e| read(e, "end_byte"))? as usize,
            row.get::<_, i64>(6).map_err(|e| read(e, "start_line"))? as u32,
            row.get::<_, i64>(7).map_err(|e| read(e, "end_line"))? as u32,
        );
        let mut chunk = CodeChunk::new(
            row.get::<_, String>(1).map_err(|e| read(e, "source_file"))?,
            row.get::<_, String>(2).map_err(|e| read(e, "content"))?,
            row.get::<_, i64>(3).map_err(|e| read(e, "sequence_index"))? as usize,
            span,
            Language::parse(&row.get::<_, String>(8).map_err(|e| read(e, "language"))?),
            NodeType::parse(&row.get::<_, String>(9).map_err(|e| read(e, "node_type"))?),
        );
        if let Some(name) = row
            .get::<_, Option<String>>(10)
            .map_err(|e| read(e, "symbol_name"))?
        {
            chunk = chunk.with_symbol_name(name);
        }

        let distance: f64 = row.get(11).map_err(|e| read(e, "distance"))?;
        Ok(SearchResult::new(
            row.get::<_, String>(0).map_err(|e| read(e, "id"))?,
            chunk,
            distance as f32,
        ))
    }
}

#[async_trait]
impl VectorRepository for DuckdbVectorRepository {
    async fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
    ) -> Result<CollectionHandle, DomainError> {
        validate_collection_name(name, kind)?;

        let mut conn = self.conn.lock().await;
        match Self::registration(&conn, name)? {
            Some((CollectionKind::Persistent, dimensions))
                if kind == CollectionKind::Persistent =>
            {
                if dimensions != self.dimensions {
                    return Err(DomainError::invalid_input(format!(
                        "Collection {} stores {}-dimensional vectors, embedder produces {}",
                        name, dimensions, self.dimensions
                    )));
                }
                debug!("Reusing persistent collection {}", name);
                return Ok(CollectionHandle::new(name.to_string(), kind));
            }
            Some((existing, _)) => {
                return Err(DomainError::name_conflict(format!(
                    "{} already exists as a {} collection",
                    name, existing
                )));
            }
            None => {}
        }

        let schema = Self::schema_name(name);
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute_batch(&format!(
            "\
            CREATE SCHEMA IF NOT EXISTS \"{schema}\";
            CREATE TABLE IF NOT EXISTS \"{schema}\".chunks (
                id TEXT PRIMARY KEY,
                position BIGINT NOT NULL,
                source_file TEXT NOT NULL,
                content TEXT NOT NULL,
                sequence_index BIGINT NOT NULL,
                start_byte BIGINT NOT NULL,
                end_byte BIGINT NOT NULL,
                start_line BIGINT NOT NULL,
                end_line BIGINT NOT NULL,
                language TEXT NOT NULL,
                node_type TEXT NOT NULL,
                symbol_name TEXT,
                vector FLOAT[{dimensions}] NOT NULL
            );
            ",
            schema = schema,
            dimensions = self.dimensions
        ))
        .map_err(|e| DomainError::storage(format!("Failed to create collection {}: {}", name, e)))?;

        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        tx.execute(
            "INSERT INTO collections (name, kind, dimensions, created_at) VALUES (?, ?, ?, ?)",
            params![name, kind.as_str(), self.dimensions as i64, created_at],
        )
        .map_err(|e| DomainError::storage(format!("Failed to register collection {}: {}", name, e)))?;

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Created {} collection {} in schema {}", kind, name, schema);
        Ok(CollectionHandle::new(name.to_string(), kind))
    }

    async fn add(
        &self,
        handle: &CollectionHandle,
        chunks: &[CodeChunk],
        vectors: &[Vec<f32>],
    ) -> Result<(), DomainError> {
        if chunks.len() != vectors.len() {
            return Err(DomainError::invalid_input(format!(
                "Chunk and vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let literals = vectors
            .iter()
            .map(|v| self.vector_to_array_literal(v))
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn.lock().await;
        Self::require_collection(&conn, handle)?;
        let base = Self::next_position(&conn, handle.name())?;
        let schema = Self::schema_name(handle.name());

        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        for (i, (chunk, array_lit)) in chunks.iter().zip(&literals).enumerate() {
            let position = base + i as u64;
            let id = format!("chunk_{}", position);
            let span = chunk.span();
            // FLOAT[N] values cannot be bound as parameters, so the literal is inlined.
            let sql = format!(
                "INSERT INTO \"{}\".chunks \
                (id, position, source_file, content, sequence_index, start_byte, end_byte, \
                start_line, end_line, language, node_type, symbol_name, vector) \
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, {})",
                schema, array_lit
            );
            tx.execute(
                &sql,
                params![
                    id,
                    position as i64,
                    chunk.source_file(),
                    chunk.content(),
                    chunk.sequence_index() as i64,
                    span.start_byte as i64,
                    span.end_byte as i64,
                    span.start_line as i64,
                    span.end_line as i64,
                    chunk.language().as_str(),
                    chunk.node_type().as_str(),
                    chunk.symbol_name(),
                ],
            )
            .map_err(|e| DomainError::storage(format!("Failed to insert chunk {}: {}", id, e)))?;
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Saved {} chunks to DuckDB collection {}", chunks.len(), handle.name());
        Ok(())
    }

    async fn query(
        &self,
        handle: &CollectionHandle,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let array_lit = self.vector_to_array_literal(query_vector)?;
        let sql = format!(
            "SELECT \
                id, source_file, content, sequence_index, start_byte, end_byte, start_line, end_line, \
                language, node_type, symbol_name, \
                CAST(array_distance(vector, {array_lit}) AS DOUBLE) AS distance \
            FROM \"{schema}\".chunks \
            ORDER BY distance ASC, position ASC \
            LIMIT ?",
            array_lit = array_lit,
            schema = Self::schema_name(handle.name())
        );

        let conn = self.conn.lock().await;
        Self::require_collection(&conn, handle)?;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare query: {}", e)))?;
        let mut rows = stmt
            .query(params![top_k as i64])
            .map_err(|e| DomainError::storage(format!("Failed to run query: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        {
            results.push(Self::row_to_result(row)?);
        }
        Ok(results)
    }

    async fn delete_by_source_file(
        &self,
        handle: &CollectionHandle,
        source_file: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        Self::require_collection(&conn, handle)?;

        let deleted = conn
            .execute(
                &format!(
                    "DELETE FROM \"{}\".chunks WHERE source_file = ?",
                    Self::schema_name(handle.name())
                ),
                params![source_file],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;

        debug!(
            "Deleted {} chunks for file {} in collection {}",
            deleted,
            source_file,
            handle.name()
        );
        Ok(deleted as u64)
    }

    async fn drop_collection(&self, handle: &CollectionHandle) -> Result<(), DomainError> {
        let mut conn = self.conn.lock().await;
        Self::drop_schema(&mut conn, handle.name())?;
        debug!("Dropped DuckDB collection {}", handle.name());
        Ok(())
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        Self::require_collection(&conn, handle)?;
        Self::count_rows(&conn, handle.name())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, DomainError> {
        let conn = self.conn.lock().await;
        let registered = {
            let mut stmt = conn
                .prepare("SELECT name, kind FROM collections ORDER BY name")
                .map_err(|e| DomainError::storage(format!("Failed to prepare list: {}", e)))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(|e| DomainError::storage(format!("Failed to list collections: {}", e)))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        };

        registered
            .into_iter()
            .map(|(name, kind)| -> Result<CollectionInfo, DomainError> {
                let chunk_count = Self::count_rows(&conn, &name)?;
                Ok(CollectionInfo {
                    kind: CollectionKind::parse(&kind)?,
                    name,
                    chunk_count,
                })
            })
            .collect()
    }
}
