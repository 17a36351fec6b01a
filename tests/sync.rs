use fastlzlib::full::compress_buffer;
use fastlzlib::header::{BlockHeader, BlockType, HEADER_SIZE};
use fastlzlib::{Context, Error, Status, Stream, StreamBuffers};

/// Returns bytes that can never start a block header.
fn garbage(len: usize) -> Vec<u8> {
    use rand::thread_rng;
    use rand_distr::{Distribution, Uniform};

    let mut rng = thread_rng();
    let distr = Uniform::new_inclusive(0x80u8, 0xffu8);
    (0..len).map(|_| distr.sample(&mut rng)).collect()
}

fn text(len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0u32;
    while out.len() < len {
        let line = format!("line {} of the log\n", i % 97);
        out.extend_from_slice(line.as_bytes());
        i += 1;
    }
    out.truncate(len);
    out
}

#[test]
fn test_sync_after_garbage() {
    let data = text(3000);
    let compressed = compress_buffer(&data, Context::new(9, 4096)).unwrap();

    for skip in [0, 1, 5, 19, 20, 100, 5000] {
        let mut input = garbage(skip);
        input.extend_from_slice(&compressed);

        let mut stream = Stream::decompressor(4096).unwrap();
        let mut out = vec![0; 4096];
        let mut io = StreamBuffers::new(&input, &mut out);
        assert_eq!(stream.find_sync(&mut io), Ok(()));
        assert_eq!(io.consumed(), skip);
        assert_eq!(stream.total_in(), skip as u64);

        assert_eq!(stream.decompress(&mut io), Ok(Status::Ok));
        assert_eq!(stream.decompress(&mut io), Ok(Status::StreamEnd));
        assert_eq!(io.output(), &data[..]);
    }
}

#[test]
fn test_sync_not_found() {
    let input = garbage(100);
    let mut stream = Stream::decompressor(4096).unwrap();
    let mut out = vec![0; 64];
    let mut io = StreamBuffers::new(&input, &mut out);
    assert_eq!(stream.find_sync(&mut io), Err(Error::NoSyncPoint));
    // The last bytes could still be the start of a header.
    assert_eq!(io.consumed(), 100 - HEADER_SIZE + 1);
    assert!(stream.message().is_some());
}

#[test]
fn test_sync_needs_input() {
    let input = garbage(HEADER_SIZE - 1);
    let mut stream = Stream::decompressor(4096).unwrap();
    let mut out = vec![0; 64];
    let mut io = StreamBuffers::new(&input, &mut out);
    assert_eq!(stream.find_sync(&mut io), Err(Error::NeedMoreInput));
    assert_eq!(io.consumed(), 0);
}

#[test]
fn test_sync_skips_zero_block_size() {
    let data = text(1000);
    let compressed = compress_buffer(&data, Context::new(9, 4096)).unwrap();

    // A magic without a block size is not accepted as a sync point.
    let fake = BlockHeader::new(BlockType::Raw, 0, 10, 10).encode();
    let mut input = fake.to_vec();
    input.extend_from_slice(&compressed);

    let mut stream = Stream::decompressor(4096).unwrap();
    let mut out = vec![0; 4096];
    let mut io = StreamBuffers::new(&input, &mut out);
    assert_eq!(stream.find_sync(&mut io), Ok(()));
    assert_eq!(io.consumed(), HEADER_SIZE);
}

#[test]
fn test_sync_with_pending_output() {
    let data = text(3000);
    let compressed = compress_buffer(&data, Context::new(9, 4096)).unwrap();

    let mut stream = Stream::decompressor(4096).unwrap();
    let mut out = vec![0; 100];
    let mut io = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(stream.decompress(&mut io), Ok(Status::Ok));
    assert!(stream.has_pending_output());

    // Nothing is skipped while decoded bytes wait for the caller.
    let consumed = io.consumed();
    assert_eq!(stream.find_sync(&mut io), Ok(()));
    assert_eq!(io.consumed(), consumed);
    assert!(stream.has_pending_output());
}

#[test]
fn test_recover_after_corruption() {
    let data = garbage(3000);
    let ctx = Context::new(9, 1024);
    let mut compressed = compress_buffer(&data, ctx).unwrap();
    let first = BlockHeader::decode(&compressed).unwrap();
    let second_offset = HEADER_SIZE + first.compressed as usize;
    compressed[1] = b'X';

    let mut stream = Stream::decompressor(1024).unwrap();
    let mut out = vec![0; 4096];
    let mut io = StreamBuffers::new(&compressed, &mut out);
    assert_eq!(stream.decompress(&mut io), Err(Error::CorruptBadMagic));
    assert_eq!(io.consumed(), 0);

    assert_eq!(stream.find_sync(&mut io), Ok(()));
    assert_eq!(io.consumed(), second_offset);

    loop {
        if stream.decompress(&mut io).unwrap() == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(io.output(), &data[first.original as usize..]);
}

#[test]
fn test_sync_drops_partial_header() {
    let data = text(1000);
    let compressed = compress_buffer(&data, Context::new(9, 4096)).unwrap();
    let junk = garbage(30);

    let mut stream = Stream::decompressor(4096).unwrap();
    let mut out = vec![0; 4096];

    // A partial header of junk is buffered by the stream.
    let mut io = StreamBuffers::new(&junk[..10], &mut out);
    assert_eq!(stream.decompress(&mut io), Ok(Status::Ok));
    assert_eq!(io.consumed(), 10);

    let mut input = junk[10..].to_vec();
    input.extend_from_slice(&compressed);
    let mut io = StreamBuffers::new(&input, &mut out);
    assert_eq!(stream.find_sync(&mut io), Ok(()));
    assert_eq!(io.consumed(), 20);

    assert_eq!(stream.decompress(&mut io), Ok(Status::Ok));
    assert_eq!(io.output(), &data[..]);
}
