use fastlzlib::header::{
    header_size, is_compressed_stream, probe_stream, stream_block_size,
    BlockHeader, BlockType, BLOCK_MAGIC, HEADER_SIZE,
};
use fastlzlib::Error;

#[test]
fn test_header_layout() {
    let header = BlockHeader::new(BlockType::Raw, 32768, 500, 501);
    let bytes = header.encode();
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert_eq!(&bytes[..7], b"FastLZ\0");
    assert_eq!(bytes[7], 0xc0);
    assert_eq!(bytes[8..12], 500u32.to_le_bytes());
    assert_eq!(bytes[12..16], 501u32.to_le_bytes());
    assert_eq!(bytes[16..20], 32768u32.to_le_bytes());
    assert_eq!(header_size(), 20);
}

#[test]
fn test_header_round_trip() {
    let headers = [
        BlockHeader::new(BlockType::Raw, 64, 64, 64),
        BlockHeader::new(BlockType::Compressed, 32768, 1200, 32768),
        BlockHeader::new(BlockType::Compressed, 1 << 20, 7, 4096),
        BlockHeader::end_of_stream(1024),
    ];
    for header in headers {
        let bytes = header.encode();
        assert_eq!(BlockHeader::decode(&bytes), Ok(header));
    }

    // The original size and the block size are separate fields.
    let header = BlockHeader::new(BlockType::Compressed, 4096, 10, 1234);
    let decoded = BlockHeader::decode(&header.encode()).unwrap();
    assert_eq!(decoded.original, 1234);
    assert_eq!(decoded.block_size, 4096);
}

#[test]
fn test_header_write_to() {
    let header = BlockHeader::new(BlockType::Compressed, 1024, 3, 9);
    let mut small = [0u8; HEADER_SIZE - 1];
    assert_eq!(header.write_to(&mut small), None);

    let mut large = [0u8; HEADER_SIZE + 5];
    assert_eq!(header.write_to(&mut large), Some(HEADER_SIZE));
    assert_eq!(large[..HEADER_SIZE], header.encode());
    assert_eq!(large[HEADER_SIZE..], [0; 5]);
}

#[test]
fn test_end_of_stream_marker() {
    let marker = BlockHeader::end_of_stream(32768);
    assert!(marker.is_end_of_stream());
    let bytes = marker.encode();
    assert_eq!(bytes[7], 0x0c);
    assert_eq!(bytes[8..16], [0; 8]);

    let block = BlockHeader::new(BlockType::Raw, 32768, 0, 10);
    assert!(!block.is_end_of_stream());
}

#[test]
fn test_header_errors() {
    let mut bytes = BlockHeader::new(BlockType::Raw, 1024, 10, 10).encode();
    assert_eq!(BlockHeader::decode(&bytes[..19]), Err(Error::NeedMoreInput));

    bytes[7] = 0x42;
    assert_eq!(
        BlockHeader::decode(&bytes),
        Err(Error::CorruptIllegalType(0x42))
    );

    for i in 0..BLOCK_MAGIC.len() {
        let mut bad = bytes;
        bad[i] ^= 0x01;
        assert_eq!(BlockHeader::decode(&bad), Err(Error::CorruptBadMagic));
    }
}

#[test]
fn test_stream_probing() {
    let bytes = BlockHeader::new(BlockType::Raw, 1024, 10, 10).encode();
    assert_eq!(stream_block_size(&bytes), 1024);
    assert!(is_compressed_stream(&bytes));
    assert_eq!(probe_stream(&bytes), Ok(true));

    // Too short to tell.
    assert_eq!(stream_block_size(&bytes[..10]), 0);
    assert!(!is_compressed_stream(&bytes[..10]));
    assert_eq!(probe_stream(&bytes[..10]), Err(Error::NeedMoreInput));

    // Bad magic.
    let mut bad = bytes;
    bad[0] = b'f';
    assert_eq!(stream_block_size(&bad), 0);
    assert_eq!(probe_stream(&bad), Ok(false));

    // A zero block size is not a plausible header.
    let zero = BlockHeader::new(BlockType::Raw, 0, 10, 10).encode();
    assert!(!is_compressed_stream(&zero));

    // The type is not checked when probing.
    let mut odd_type = bytes;
    odd_type[7] = 0x99;
    assert_eq!(stream_block_size(&odd_type), 1024);
}
