// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use postgres::{Client, Config, Error, NoTls};
use r2d2::ManageConnection;

/// R2D2 connection manager for the PostgreSQL database holding the DuckLake catalog.
#[derive(Debug)]
pub struct PostgresConnectionManager {
    config: Config,
}

impl PostgresConnectionManager {
    /// Parses `conn_str` (URL or key=value form) without connecting.
    pub fn new(conn_str: &str) -> Result<Self, Error> {
        Ok(Self {
            config: conn_str.parse()?,
        })
    }
}

impl ManageConnection for PostgresConnectionManager {
    type Connection = Client;
    type Error = Error;

    fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        self.config.connect(NoTls)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("").map(|_| ())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection_strings() {
        assert!(PostgresConnectionManager::new("postgresql://user:pw@localhost:5432/ducklake").is_ok());
        assert!(PostgresConnectionManager::new("host=localhost user=ducklake dbname=catalog").is_ok());
        assert!(PostgresConnectionManager::new("postgresql://localhost:notaport/db").is_err());
    }
}
