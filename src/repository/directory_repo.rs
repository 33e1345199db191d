// ==========================================
// 货运装车调度核心 - 网点/员工目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{invalid_text_column, open_sqlite_connection};
use crate::domain::actor::{Branch, Employee};
use crate::domain::types::{JobFunction, Role};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// DirectoryRepository - 目录仓储
// ==========================================
pub struct DirectoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DirectoryRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
        let function_raw: String = row.get(3)?;
        let role_raw: Option<String> = row.get(4)?;
        let role = match role_raw {
            Some(code) => Some(
                Role::from_code(&code).ok_or_else(|| invalid_text_column(4, "role_code", &code))?,
            ),
            None => None,
        };
        Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            branch_id: row.get(2)?,
            job_function: JobFunction::from_str(&function_raw)
                .ok_or_else(|| invalid_text_column(3, "job_function", &function_raw))?,
            role,
        })
    }

    // ==========================================
    // 网点
    // ==========================================

    pub fn upsert_branch(&self, branch: &Branch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO branch (branch_id, code, name) VALUES (?1, ?2, ?3)",
            params![branch.id, branch.code, branch.name],
        )?;
        Ok(())
    }

    pub fn list_branches(&self) -> RepositoryResult<Vec<Branch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT branch_id, code, name FROM branch ORDER BY code")?;
        let rows = stmt.query_map([], |row| {
            Ok(Branch {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        let mut branches = Vec::new();
        for row in rows {
            branches.push(row?);
        }
        Ok(branches)
    }

    // ==========================================
    // 员工
    // ==========================================

    pub fn upsert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee (employee_id, name, branch_id, job_function, role_code)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                employee.id,
                employee.name,
                employee.branch_id,
                employee.job_function.to_db_str(),
                employee.role.map(|r| r.code()),
            ],
        )?;
        Ok(())
    }

    pub fn find_employee(&self, id: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let employee = conn
            .query_row(
                r#"
                SELECT employee_id, name, branch_id, job_function, role_code
                FROM employee WHERE employee_id = ?1
                "#,
                params![id],
                Self::map_employee,
            )
            .optional()?;
        Ok(employee)
    }

    pub fn list_employees_by_branch(&self, branch_id: &str) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, name, branch_id, job_function, role_code
            FROM employee WHERE branch_id = ?1 ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map(params![branch_id], Self::map_employee)?;
        let mut employees = Vec::new();
        for row in rows {
            employees.push(row?);
        }
        Ok(employees)
    }
}
