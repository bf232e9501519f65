use std::{io::Write, num::NonZeroU64, time::Duration};

use hostperf::{format_throughput, Calibrator, RandomBlockReader};

fn main() {
    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .init();
    tracing::info!("starting");

    const BLOCK: usize = 4096;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..256u32 {
        file.write_all(&[i as u8; BLOCK]).unwrap();
    }
    file.flush().unwrap();

    let mut reader = RandomBlockReader::open(file.path(), BLOCK).unwrap();
    assert_eq!(reader.total_blocks(), 256);

    let result = Calibrator::new(Duration::from_millis(200))
        .with_max_ops(NonZeroU64::new(reader.total_blocks()).unwrap())
        .calibrate(&mut reader)
        .unwrap();
    assert!(result.operations <= 256, "a block was read twice");

    println!(
        "{} reads of {BLOCK} bytes: {} ({} probes)",
        result.operations,
        format_throughput(&result, Some(BLOCK as u64)),
        reader.sampler().probes()
    );
}
