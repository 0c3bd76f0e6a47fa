//! PostgreSQL driver (`pg_dump`)

use super::{DatabaseDriver, DriverContext};
use crate::config::DatabaseKind;

/// Dumps with `pg_dump`; the password reaches the tool through `PGPASSWORD`
/// in the child's environment, never on the command line.
pub struct PostgresDriver {
    context: DriverContext,
}

impl PostgresDriver {
    pub fn new(context: DriverContext) -> Self {
        Self { context }
    }
}

impl DatabaseDriver for PostgresDriver {
    fn context(&self) -> &DriverContext {
        &self.context
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgresql
    }

    fn build_dump_command(&self) -> Vec<String> {
        let db = &self.context.database;
        let mut command = vec![self.kind().dump_tool().to_string()];

        if !db.host.is_empty() {
            command.extend(["-h".to_string(), db.host.clone()]);
        }
        command.extend(["-p".to_string(), db.effective_port().to_string()]);
        if !db.user.is_empty() {
            command.extend(["-U".to_string(), db.user.clone()]);
        }
        if !db.database.is_empty() {
            command.extend(["-d".to_string(), db.database.clone()]);
        }

        command.push("-w".to_string()); // never prompt for a password
        command.push("--verbose".to_string());
        command
    }

    fn dump_environment(&self) -> Vec<(String, String)> {
        let password = &self.context.database.password;
        if password.is_empty() {
            Vec::new()
        } else {
            vec![("PGPASSWORD".to_string(), password.clone())]
        }
    }
}
