use fastlzlib::block::{
    compress_block, decompress_block, encode_frame, max_framed_size,
};
use fastlzlib::header::{BlockHeader, BlockType, HEADER_SIZE};
use fastlzlib::{Context, Error};

fn random_bytes(len: usize) -> Vec<u8> {
    use rand::thread_rng;
    use rand_distr::{Distribution, Uniform};

    let mut rng = thread_rng();
    let distr = Uniform::new_inclusive(0u8, 255u8);
    (0..len).map(|_| distr.sample(&mut rng)).collect()
}

fn round_trip(input: &[u8], ctx: Context) -> BlockType {
    let mut compressed = vec![0; max_framed_size(input.len())];
    let (block_type, written) =
        compress_block(ctx, input, &mut compressed).unwrap();
    assert!(written <= input.len());

    let mut decompressed = vec![0; input.len()];
    let payload = &compressed[..written];
    let res = decompress_block(block_type, payload, &mut decompressed);
    assert_eq!(res, Ok(input.len()));
    assert_eq!(decompressed, input);
    block_type
}

#[test]
fn test_small_blocks_are_raw() {
    let ctx = Context::new(9, 1024);
    assert_eq!(round_trip(&[], ctx), BlockType::Raw);
    assert_eq!(round_trip(&[1; 10], ctx), BlockType::Raw);
    assert_eq!(round_trip(&[1; 64], ctx), BlockType::Raw);
    assert_eq!(round_trip(&[1; 65], ctx), BlockType::Compressed);
}

#[test]
fn test_block_types() {
    let ctx = Context::new(9, 1 << 16);
    let text = "a block of text, a block of text. ".repeat(100);
    assert_eq!(round_trip(text.as_bytes(), ctx), BlockType::Compressed);
    assert_eq!(round_trip(&random_bytes(5000), ctx), BlockType::Raw);

    let fast = Context::new(1, 1 << 16);
    assert_eq!(round_trip(text.as_bytes(), fast), BlockType::Compressed);

    let stored = Context::new(0, 1 << 16);
    assert_eq!(round_trip(text.as_bytes(), stored), BlockType::Raw);
}

#[test]
fn test_raw_output_too_small() {
    let input = random_bytes(100);
    let mut output = vec![0; 99];
    let res = compress_block(Context::new(9, 1024), &input, &mut output);
    assert_eq!(res, Err(Error::NeedMoreOutput));
}

#[test]
fn test_decompress_size_mismatch() {
    let mut output = vec![0; 10];
    let res = decompress_block(BlockType::Raw, &[1; 9], &mut output);
    assert_eq!(res, Err(Error::TransformFailed("decompress")));

    let input = [7u8; 1000];
    let mut compressed = vec![0; 1000];
    let ctx = Context::new(9, 1024);
    let (block_type, written) =
        compress_block(ctx, &input, &mut compressed).unwrap();
    assert_eq!(block_type, BlockType::Compressed);

    // The payload decodes to more bytes than declared.
    let mut short = vec![0; 999];
    let payload = &compressed[..written];
    let res = decompress_block(block_type, payload, &mut short);
    assert_eq!(res, Err(Error::TransformFailed("decompress")));

    // And to fewer.
    let mut long = vec![0; 1001];
    let res = decompress_block(block_type, payload, &mut long);
    assert_eq!(res, Err(Error::TransformFailed("decompress")));
}

#[test]
fn test_encode_frame() {
    let ctx = Context::new(9, 1024);
    let input = random_bytes(300);
    let mut output = vec![0; max_framed_size(input.len())];

    let written = encode_frame(ctx, &input, &mut output, true).unwrap();
    assert_eq!(written, HEADER_SIZE + 300 + HEADER_SIZE);
    let header = BlockHeader::decode(&output).unwrap();
    assert_eq!(header, BlockHeader::new(BlockType::Raw, 1024, 300, 300));
    let marker = BlockHeader::decode(&output[HEADER_SIZE + 300..]).unwrap();
    assert!(marker.is_end_of_stream());

    let written = encode_frame(ctx, &input, &mut output, false).unwrap();
    assert_eq!(written, HEADER_SIZE + 300);

    // An empty chunk produces only the marker, or nothing.
    assert_eq!(encode_frame(ctx, &[], &mut output, true), Ok(HEADER_SIZE));
    assert_eq!(encode_frame(ctx, &[], &mut output, false), Ok(0));
}

#[test]
fn test_frame_growth_is_bounded() {
    let ctx = Context::new(9, 1 << 16);
    for len in [0, 1, 64, 65, 1000, 30000] {
        let input = random_bytes(len);
        let mut output = vec![0; max_framed_size(len)];
        let written = encode_frame(ctx, &input, &mut output, true).unwrap();
        assert!(written <= max_framed_size(len));
    }
}
