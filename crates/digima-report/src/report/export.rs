use super::deck::{DeckPlan, DeckTable, SectionKind};
use super::ReportError;
use std::io::Write;

impl DeckTable {
    /// Writes the header row followed by every data row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl DeckPlan {
    /// CSV text of each table in a section, in slide order.
    pub fn tables_csv(&self, kind: SectionKind) -> Result<Vec<String>, ReportError> {
        self.tables(kind).into_iter().map(DeckTable::to_csv).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_that_need_it() {
        let mut table = DeckTable::new(["クエリ", "CL"]);
        table.rows = vec![
            vec!["外壁塗装, 川口".to_string(), "12".to_string()],
            vec!["\"屋根\"".to_string(), "3".to_string()],
        ];
        let csv = table.to_csv().expect("csv renders");
        assert_eq!(csv, "クエリ,CL\n\"外壁塗装, 川口\",12\n\"\"\"屋根\"\"\",3\n");
    }

    #[test]
    fn header_only_table_renders_single_line() {
        let table = DeckTable::new(["月", "CV"]);
        assert_eq!(table.to_csv().expect("csv renders"), "月,CV\n");
    }
}
