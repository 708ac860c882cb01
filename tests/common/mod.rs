use std::fs::File;
use std::io::Error;
use std::path::Path;

pub fn write_events(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["identity", "command", "args"])?;
    for (identity, command, args) in rows {
        wtr.write_record([*identity, *command, *args])?;
    }

    wtr.flush()?;
    Ok(())
}
