//! MySQL / MariaDB driver (`mysqldump`)

use super::{DatabaseDriver, DriverContext};
use crate::config::DatabaseKind;

const PASSWORD_MASK: &str = "-p****";

/// Dumps with `mysqldump` in a single consistent transaction, including
/// routines and triggers.
///
/// The password is passed inline as `-p<password>`; a bare `-p` would make
/// the tool prompt on a terminal. Logged command lines are masked.
pub struct MysqlDriver {
    context: DriverContext,
}

impl MysqlDriver {
    pub fn new(context: DriverContext) -> Self {
        Self { context }
    }

    fn password_arg(&self) -> Option<String> {
        let password = &self.context.database.password;
        (!password.is_empty()).then(|| format!("-p{}", password))
    }
}

impl DatabaseDriver for MysqlDriver {
    fn context(&self) -> &DriverContext {
        &self.context
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Mysql
    }

    fn build_dump_command(&self) -> Vec<String> {
        let db = &self.context.database;
        let mut command = vec![self.kind().dump_tool().to_string()];

        if !db.host.is_empty() {
            command.extend(["-h".to_string(), db.host.clone()]);
        }
        command.extend(["-P".to_string(), db.effective_port().to_string()]);
        if !db.user.is_empty() {
            command.extend(["-u".to_string(), db.user.clone()]);
        }
        if let Some(password) = self.password_arg() {
            command.push(password);
        }

        command.extend([
            "--single-transaction".to_string(),
            "--routines".to_string(),
            "--triggers".to_string(),
        ]);
        command.push(db.database.clone());
        command
    }

    fn display_command(&self) -> String {
        let password = self.password_arg();
        self.build_dump_command()
            .into_iter()
            .map(|arg| {
                if Some(&arg) == password.as_ref() {
                    PASSWORD_MASK.to_string()
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
