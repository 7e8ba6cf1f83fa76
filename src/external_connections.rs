use sqlx::PgConnection;

/// A live connection to the database borrowed from some connection source, such as a pool.
/// The connection is released back to its source when the handle drops.
pub trait ConnectionHandle: Send {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to the external systems the service talks to. Driven adapters receive
/// this instead of a concrete pool so the domain can be exercised without a database.
pub trait ExternalConnectivity: Send + Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection which lives as long as the returned handle
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
