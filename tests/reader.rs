use std::io::Write;

use exonwalk::reader::{Reader, ReaderError};
use exonwalk::Strand;

const TABLE: &str = "\
# exon table
chr1\t12612\t12721\t+\t2\t2\t1\t0\t0\tuc001aaa.3[1/3],uc010nxq.1[1/3]\t*
chr1\t13220\t14409\t+\t3\t1\t0\t1\t1\tuc001aaa.3[3/3]\tP0001
chr1\t19941\t20036\t-\t33\t2\t0\t0\t0\tuc009viy.2[4/9],uc009vjf.2[5/7]\t*\t1\t1\tDUP\tchr1\t18267\t18362\t-
";

#[test]
fn test_reader_from_string() {
    let mut reader = Reader::from_reader(std::io::Cursor::new(TABLE)).unwrap();
    let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.chrom, "chr1");
    assert_eq!(first.start, 12612);
    assert_eq!(first.end, 12721);
    assert_eq!(first.strand, Strand::Forward);
    assert_eq!(first.exon_id, "2");
    assert_eq!(first.first_count, 1);
    assert_eq!(
        first.start_names().collect::<Vec<_>>(),
        vec!["uc001aaa.3", "uc010nxq.1"]
    );

    let second = &records[1];
    assert!(second.is_protein);
    assert_eq!(second.protein_id.as_deref(), Some("P0001"));
    assert!(second.terminates("uc001aaa.3"));

    let third = &records[2];
    assert_eq!(third.strand, Strand::Reverse);
    assert_eq!(third.sv.as_ref().unwrap().sv_type, "DUP");
    assert_eq!(reader.current_line(), 4);
}

#[test]
fn test_reader_drops_short_lines() {
    let data = "chr1\t10\t20\nchr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/1]\t*\nmalformed_line\n";
    let mut reader = Reader::from_reader(std::io::Cursor::new(data)).unwrap();
    let records: Vec<_> = reader.records().collect();

    assert_eq!(records.len(), 1);
    assert!(records[0].is_ok());
    assert_eq!(reader.skipped(), 2);
}

#[test]
fn test_reader_min_fields() {
    let data = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/2]\nchr1\t30\t40\t+\te2\t1\t0\t1\t0\tA[2/2]\t*\n";
    let exons = Reader::builder()
        .from_reader(std::io::Cursor::new(data))
        .min_fields(11)
        .build()
        .unwrap()
        .read_exons()
        .unwrap();

    assert_eq!(exons.len(), 1);
    assert_eq!(exons[0].exon_id, "e2");
}

#[test]
fn test_reader_invalid_field() {
    let data = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/1]\t*\nchr1\tx\t20\t+\te2\t1\t1\t0\t0\tB[1/1]\t*\n";
    let mut reader = Reader::from_reader(std::io::Cursor::new(data)).unwrap();
    let records: Vec<_> = reader.records().collect();

    assert!(records[0].is_ok());
    match &records[1] {
        Err(ReaderError::InvalidField { line, field, .. }) => {
            assert_eq!(*line, 2);
            assert_eq!(*field, "start");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_reader_invalid_strand() {
    let data = "chr1\t10\t20\tx\te1\t1\t1\t0\t0\tA[1/1]\t*\n";
    let result = Reader::from_reader(std::io::Cursor::new(data))
        .unwrap()
        .read_exons();
    assert!(result.is_err());
}

#[test]
fn test_reader_empty_input() {
    let exons = Reader::from_reader(std::io::Cursor::new(""))
        .unwrap()
        .read_exons()
        .unwrap();
    assert!(exons.is_empty());
}

#[test]
fn test_reader_crlf_lines() {
    let data = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/1]\t*\r\n";
    let exons = Reader::from_reader(std::io::Cursor::new(data))
        .unwrap()
        .read_exons()
        .unwrap();
    assert_eq!(exons[0].protein_id, None);
    assert_eq!(exons[0].field_count(), 11);
}

#[test]
fn test_reader_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TABLE.as_bytes()).unwrap();
    file.flush().unwrap();

    let exons = Reader::from_path(file.path()).unwrap().read_exons().unwrap();
    assert_eq!(exons.len(), 3);
}

#[test]
fn test_reader_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let result = Reader::from_path(dir.path().join("missing.bed"));
    assert!(matches!(result, Err(ReaderError::Io(_))));
}

#[test]
fn test_builder_without_source() {
    assert!(matches!(
        Reader::builder().build(),
        Err(ReaderError::Builder(_))
    ));
}

#[cfg(feature = "gzip")]
#[test]
fn test_reader_gzip_path() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exons.bed.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
    encoder.write_all(TABLE.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let exons = Reader::from_path(&path).unwrap().read_exons().unwrap();
    assert_eq!(exons.len(), 3);
}

#[cfg(feature = "mmap")]
#[test]
fn test_reader_mmap() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TABLE.as_bytes()).unwrap();
    file.flush().unwrap();

    let exons = Reader::from_mmap(file.path()).unwrap().read_exons().unwrap();
    assert_eq!(exons.len(), 3);
    assert_eq!(exons[2].exon_id, "33");
}

#[cfg(feature = "rayon")]
#[test]
fn test_reader_parallel_keeps_order() {
    let exons = Reader::from_reader(std::io::Cursor::new(TABLE))
        .unwrap()
        .par_read_exons()
        .unwrap();
    let ids: Vec<_> = exons.iter().map(|e| e.exon_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "33"]);
}

#[test]
fn test_reader_keeps_placeholder_sv_columns() {
    let data = "chr1\t100\t200\t+\te1\t1\t1\t0\t0\tA[1/2]\t*\t*\t*\t*\t*\t*\t*\t*\n\
                chr1\t300\t400\t+\te2\t1\t0\t1\t0\tA[2/2]\t*\t1\t2\tADUP\tchr1\t*\t600\t+\n";
    let exons = Reader::from_reader(std::io::Cursor::new(data))
        .unwrap()
        .read_exons()
        .unwrap();
    assert_eq!(exons.len(), 2);

    let sv = exons[0].sv.as_ref().unwrap();
    assert_eq!(sv.sv_type, "*");
    assert_eq!(sv.original, None);
    assert!(exons[0].is_complete_fragment());

    let sv = exons[1].sv.as_ref().unwrap();
    assert_eq!(sv.sv_type, "ADUP");
    assert_eq!(sv.original, None);
}

#[test]
fn test_reader_blank_first_count_reads_as_zero() {
    let data = "chr1\t100\t200\t+\te1\t1\t\t0\t0\tA[1/2]\t*\nchr1\t300\t400\t+\te2\t1\tn/a\t1\t0\tA[2/2]\t*\n";
    let exons = Reader::from_reader(std::io::Cursor::new(data))
        .unwrap()
        .read_exons()
        .unwrap();
    assert_eq!(exons[0].first_count, 0);
    assert_eq!(exons[1].first_count, 0);
}
