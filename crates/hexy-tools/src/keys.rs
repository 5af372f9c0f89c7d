//! # 按键解码
//!
//! 把终端原始字节流转换成离散按键。终端需要调用方事先切换到 raw 模式；
//! 本模块只负责解码。
//!
//! | 字节 | 按键 |
//! |------|------|
//! | `ESC [ A/B/C/D` | 上/下/右/左 |
//! | `\r` / `\n` | 回车 |
//! | `\t` | Tab |
//! | `0x03` | Ctrl-C |
//! | 可打印 ASCII | 字符 |
//!
//! 新的 ESC 或控制字符会丢弃未完成的转义序列。

use std::io::{self, Read};

use crate::ToolsError;

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Return,
    Tab,
    Interrupt,
    Char(char),
    Unknown,
}

/// 字节流 → 按键
#[derive(Debug)]
pub struct KeyDecoder<R> {
    reader: R,
}

impl<R: Read> KeyDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// 阻塞读取下一个按键；输入结束返回 `None`
    pub fn next_key(&mut self) -> Result<Option<Key>, ToolsError> {
        let mut pending: Vec<u8> = Vec::with_capacity(3);
        loop {
            let Some(byte) = self.read_byte()? else {
                return Ok((!pending.is_empty()).then_some(Key::Unknown));
            };

            match byte {
                b'\r' | b'\n' => return Ok(Some(Key::Return)),
                b'\t' => return Ok(Some(Key::Tab)),
                CTRL_C => return Ok(Some(Key::Interrupt)),
                ESC => {
                    pending.clear();
                    pending.push(byte);
                },
                _ if pending.is_empty() => {
                    let key = if byte.is_ascii_graphic() || byte == b' ' {
                        Key::Char(char::from(byte))
                    } else {
                        Key::Unknown
                    };
                    return Ok(Some(key));
                },
                _ => {
                    pending.push(byte);
                    if pending.len() == 3 {
                        return Ok(Some(Self::escape_sequence(&pending[1..])));
                    }
                },
            }
        }
    }

    fn escape_sequence(tail: &[u8]) -> Key {
        match tail {
            [b'[', b'A'] => Key::Up,
            [b'[', b'B'] => Key::Down,
            [b'[', b'C'] => Key::Right,
            [b'[', b'D'] => Key::Left,
            _ => Key::Unknown,
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ToolsError> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Iterator for KeyDecoder<R> {
    type Item = Result<Key, ToolsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}
