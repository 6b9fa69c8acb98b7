use crate::common::error::Result;
use crate::common::types::EventRecord;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 10] = [
    "イベント名",
    "場所",
    "住所",
    "緯度",
    "経度",
    "開催日",
    "概要",
    "公開日",
    "情報源",
    "URL",
];

/// Writes the run's records as UTF-8-with-BOM CSV. The BOM keeps Excel from
/// mangling Japanese text when the file is opened by double-click.
pub fn write_csv(records: &[EventRecord], path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([
            record.name.as_str(),
            record.place.as_str(),
            record.address.as_str(),
            record.latitude.as_str(),
            record.longitude.as_str(),
            record.date_info.as_str(),
            record.description.as_str(),
            record.release_date.as_str(),
            record.source_label.as_str(),
            record.source_url.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
