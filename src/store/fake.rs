use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use super::AttendanceStore;
use crate::model::attendance::{AttendanceColumn, AttendanceRecord, NewAttendance};
use crate::model::employee::Employee;
use crate::supabase::UpstreamError;
use crate::utils::time::DayWindow;

/// In-memory stand-in for the PostgREST tables.
#[derive(Default)]
pub struct FakeStore {
    pub employees: Mutex<Vec<Employee>>,
    pub records: Mutex<Vec<AttendanceRecord>>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
    /// Next conditional patch behaves as if another scan filled the column first.
    pub lose_next_patch: AtomicBool,
}

impl FakeStore {
    pub fn with_employee(id: i64, code: &str) -> Self {
        let store = Self::default();
        store.employees.lock().unwrap().push(Employee {
            id,
            qr_code: code.to_string(),
            full_name: None,
        });
        store
    }

    pub fn push_record(&self, record: AttendanceRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write_guard(&self) -> Result<(), UpstreamError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for FakeStore {
    async fn find_employee_by_code(&self, code: &str) -> Result<Option<Employee>, UpstreamError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.qr_code == code)
            .cloned())
    }

    async fn find_attendance_in_window(
        &self,
        employee_id: i64,
        window: &DayWindow,
    ) -> Result<Option<AttendanceRecord>, UpstreamError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .find(|r| r.created_at.is_some_and(|at| window.contains(&at)))
            .cloned())
    }

    async fn insert_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, UpstreamError> {
        self.write_guard()?;
        let mut records = self.records.lock().unwrap();
        let row = AttendanceRecord {
            id: records.len() as i64 + 1,
            employee_id: record.employee_id,
            day_of_week: record.day_of_week,
            check_in: Some(record.check_in),
            check_out: None,
            present: record.present,
            created_at: Some(record.check_in),
        };
        records.push(row.clone());
        Ok(row)
    }

    async fn mark_if_unset(
        &self,
        record_id: i64,
        column: AttendanceColumn,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>, UpstreamError> {
        self.write_guard()?;
        let mut records = self.records.lock().unwrap();
        let Some(row) = records.iter_mut().find(|r| r.id == record_id) else {
            return Ok(None);
        };

        let slot = match column {
            AttendanceColumn::CheckIn => &mut row.check_in,
            AttendanceColumn::CheckOut => &mut row.check_out,
        };
        if self.lose_next_patch.swap(false, Ordering::SeqCst) {
            // the competing scan stamped it a moment earlier
            *slot = Some(at);
            return Ok(None);
        }
        if slot.is_some() {
            return Ok(None);
        }
        *slot = Some(at);
        Ok(Some(row.clone()))
    }
}
