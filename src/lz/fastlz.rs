//! A FastLZ block implementation. Both level 1 and level 2 streams are
//! supported. The level is stored in the top three bits of the first byte,
//! so the decoder detects it on its own.
//!
//! Every instruction starts with a control byte. Values below 32 are literal
//! runs of (ctrl + 1) bytes. Larger values are matches: the top three bits
//! hold the match length (minus two, with 7 meaning "more length bytes
//! follow") and the low five bits hold the high part of the distance.

use crate::{Context, Decoder, Encoder};

/// The longest literal run that one control byte can describe.
const MAX_COPY: usize = 32;
/// The longest match that level 1 can describe.
const MAX_L1_LEN: usize = 264;
/// The largest distance (minus one) that level 1 can describe.
const MAX_L1_DISTANCE: usize = 8191;
/// Level 2 distances (minus one) at or above this value use the far encoding.
const MAX_L2_DISTANCE: usize = 8191;
/// The largest distance (minus one) that level 2 can describe.
const MAX_FAR_DISTANCE: usize = 65535 + MAX_L2_DISTANCE - 1;
/// The size of the hash table (1<<x).
const HASH_LOG: usize = 13;
/// The minimum size of the match word.
const MIN_MATCH: usize = 3;
/// Far matches take two more bytes, so shorter ones are not worth it.
const MIN_FAR_MATCH: usize = 5;
/// Used to mark empty cells.
const EMPTY_CELL: u32 = 0xffffffff;

fn read24(input: &[u8], idx: usize) -> u32 {
    input[idx] as u32
        | (input[idx + 1] as u32) << 8
        | (input[idx + 2] as u32) << 16
}

fn hash_to_index(val: u32) -> usize {
    let val = val.wrapping_mul(0x9e3779b1);
    (val >> (32 - HASH_LOG)) as usize
}

/// A FastLZ Encoder.
pub struct FastLZEncoder<'a> {
    /// The uncompressed input.
    input: &'a [u8],
    /// The output buffer. Encoding fails if it is too small.
    output: &'a mut [u8],
    /// Points to the next byte to write.
    cursor: usize,
    /// The FastLZ level (1 or 2).
    level: u8,
}

impl<'a> FastLZEncoder<'a> {
    pub fn with_level(
        input: &'a [u8],
        output: &'a mut [u8],
        level: u8,
    ) -> Self {
        Self {
            input,
            output,
            cursor: 0,
            level: level.clamp(1, 2),
        }
    }

    fn push(&mut self, val: u8) -> Option<()> {
        *self.output.get_mut(self.cursor)? = val;
        self.cursor += 1;
        Some(())
    }

    fn push_run(&mut self, val: usize) -> Option<()> {
        let mut val = val;
        while val >= 255 {
            self.push(255)?;
            val -= 255;
        }
        self.push(val as u8)
    }

    /// Emit the literals in runs of up to MAX_COPY bytes.
    fn encode_literals(&mut self, literals: &[u8]) -> Option<()> {
        for chunk in literals.chunks(MAX_COPY) {
            self.push((chunk.len() - 1) as u8)?;
            let end = self.cursor + chunk.len();
            self.output.get_mut(self.cursor..end)?.copy_from_slice(chunk);
            self.cursor = end;
        }
        Some(())
    }

    /// Emit a match of 'match_len' bytes that starts 'distance + 1' bytes
    /// before the current position.
    fn encode_match(
        &mut self,
        match_len: usize,
        distance: usize,
    ) -> Option<()> {
        debug_assert!(match_len >= MIN_MATCH);
        let len = match_len - 2;

        if self.level == 1 {
            debug_assert!(len <= MAX_L1_LEN - 2);
            debug_assert!(distance <= MAX_L1_DISTANCE);
            let high = (distance >> 8) as u8;
            if len < 7 {
                self.push(((len as u8) << 5) + high)?;
            } else {
                self.push((7 << 5) + high)?;
                self.push((len - 7) as u8)?;
            }
            return self.push((distance & 255) as u8);
        }

        let (high, low, far) = if distance < MAX_L2_DISTANCE {
            ((distance >> 8) as u8, (distance & 255) as u8, None)
        } else {
            (31, 255, Some(distance - MAX_L2_DISTANCE))
        };

        if len < 7 {
            self.push(((len as u8) << 5) + high)?;
        } else {
            self.push((7 << 5) + high)?;
            self.push_run(len - 7)?;
        }
        self.push(low)?;

        if let Some(far) = far {
            self.push((far >> 8) as u8)?;
            self.push((far & 255) as u8)?;
        }
        Some(())
    }

    fn encode_impl(&mut self) -> Option<usize> {
        let input = self.input;
        let len = input.len();
        self.cursor = 0;
        if len == 0 {
            return Some(0);
        }

        let (max_len, max_distance) = if self.level == 1 {
            (MAX_L1_LEN, MAX_L1_DISTANCE)
        } else {
            (usize::MAX, MAX_FAR_DISTANCE)
        };

        // Maps a hash of three bytes to their last index in the input.
        let mut dict = vec![EMPTY_CELL; 1 << HASH_LOG];
        let mut anchor = 0;
        let mut idx = 0;

        while idx + MIN_MATCH <= len {
            let seq = read24(input, idx);
            let dic_idx = hash_to_index(seq);
            let loc = dict[dic_idx];
            dict[dic_idx] = idx as u32;

            if loc != EMPTY_CELL {
                let loc = loc as usize;
                let distance = idx - loc - 1;
                // The match could be a hash collision.
                if distance <= max_distance && read24(input, loc) == seq {
                    let mut match_len = MIN_MATCH;
                    while idx + match_len < len
                        && match_len < max_len
                        && input[loc + match_len] == input[idx + match_len]
                    {
                        match_len += 1;
                    }

                    if self.level == 2
                        && distance >= MAX_L2_DISTANCE
                        && match_len < MIN_FAR_MATCH
                    {
                        idx += 1;
                        continue;
                    }

                    self.encode_literals(&input[anchor..idx])?;
                    self.encode_match(match_len, distance)?;
                    idx += match_len;
                    anchor = idx;
                    continue;
                }
            }
            idx += 1;
        }

        // Encode the last literal block.
        self.encode_literals(&input[anchor..])?;

        // The first instruction is always a literal run, so its top bits are
        // free to carry the level.
        if self.level == 2 {
            self.output[0] |= 1 << 5;
        }
        Some(self.cursor)
    }
}

/// A FastLZ Decoder.
pub struct FastLZDecoder<'a> {
    /// The compressed input.
    input: &'a [u8],
    /// The output buffer. Decoding fails if it is too small.
    output: &'a mut [u8],
    /// Points to the current byte to process.
    cursor: usize,
}

impl<'a> FastLZDecoder<'a> {
    fn next_byte(&mut self) -> Option<usize> {
        let val = *self.input.get(self.cursor)?;
        self.cursor += 1;
        Some(val as usize)
    }

    /// Copy 'len' bytes that start 'back' bytes before 'op' to 'op'.
    fn copy_match(&mut self, op: usize, back: usize, len: usize) -> Option<()> {
        // Check that the match window does not overflow.
        if back > op || op + len > self.output.len() {
            return None;
        }
        let start = op - back;
        if back >= len {
            self.output.copy_within(start..start + len, op);
        } else {
            // Overlapping copies repeat the pattern.
            for i in 0..len {
                self.output[op + i] = self.output[start + i];
            }
        }
        Some(())
    }

    fn decode_impl(&mut self) -> Option<(usize, usize)> {
        self.cursor = 0;
        if self.input.is_empty() {
            return Some((0, 0));
        }

        let level = (self.input[0] >> 5) + 1;
        if level > 2 {
            return None;
        }

        let mut written = 0;
        let mut ctrl = self.next_byte()? & 31;
        loop {
            if ctrl >= 32 {
                let mut len = (ctrl >> 5) - 1;
                let high = (ctrl & 31) << 8;
                if len == 6 {
                    if level == 1 {
                        len += self.next_byte()?;
                    } else {
                        loop {
                            let code = self.next_byte()?;
                            len += code;
                            if code != 255 {
                                break;
                            }
                        }
                    }
                }
                let low = self.next_byte()?;
                let mut back = high + low + 1;
                if level == 2 && low == 255 && high == 31 << 8 {
                    let far = (self.next_byte()? << 8) + self.next_byte()?;
                    back = far + MAX_L2_DISTANCE + 1;
                }
                len += MIN_MATCH;
                self.copy_match(written, back, len)?;
                written += len;
            } else {
                let run = ctrl + 1;
                let end = self.cursor + run;
                let literals = self.input.get(self.cursor..end)?;
                self.output
                    .get_mut(written..written + run)?
                    .copy_from_slice(literals);
                self.cursor = end;
                written += run;
            }

            if self.cursor >= self.input.len() {
                return Some((self.cursor, written));
            }
            ctrl = self.next_byte()?;
        }
    }
}

impl<'a> Encoder<'a> for FastLZEncoder<'a> {
    fn new(input: &'a [u8], output: &'a mut [u8], ctx: Context) -> Self {
        Self::with_level(input, output, ctx.fastlz_level())
    }

    fn encode(&mut self) -> Option<usize> {
        self.encode_impl()
    }
}

impl<'a> Decoder<'a> for FastLZDecoder<'a> {
    fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self {
            input,
            output,
            cursor: 0,
        }
    }

    fn decode(&mut self) -> Option<(usize, usize)> {
        self.decode_impl()
    }
}
