//! CSV 표 출력
//!
//! 열 순서: `graph_depth,src_path,src_pname,target_path,target_pname`

use std::io::Write;

use super::TableRow;
use crate::error::EngineError;

/// 표 출력 대상 trait
pub trait TableSink {
    /// 깊이가 붙은 행들을 출력합니다.
    fn export_table(&mut self, rows: &[TableRow]) -> Result<(), EngineError>;
}

/// CSV 출력기
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// 출력 대상을 감쌉니다.
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// 내부 출력 대상을 돌려받습니다.
    pub fn into_inner(self) -> Result<W, EngineError> {
        self.writer
            .into_inner()
            .map_err(|e| EngineError::Render(format!("failed to flush csv output: {e}")))
    }
}

impl<W: Write> TableSink for CsvWriter<W> {
    fn export_table(&mut self, rows: &[TableRow]) -> Result<(), EngineError> {
        for row in rows {
            self.writer
                .serialize(row)
                .map_err(|e| EngineError::Render(format!("failed to write csv row: {e}")))?;
        }
        self.writer
            .flush()
            .map_err(|e| EngineError::Render(format!("failed to flush csv output: {e}")))
    }
}
