use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::take;
use crate::error::C3dError;

/// Wire type codes of parameter data.
pub const TYPE_CHAR: i8 = -1;
pub const TYPE_BYTE: i8 = 1;
pub const TYPE_INT16: i8 = 2;
pub const TYPE_FLOAT: i8 = 4;

/// Size of the record that terminates the parameter directory.
pub const TERMINATOR_LEN: u64 = 5;

/// A typed parameter value. Every shape C3D parameters are written with has
/// its own variant, so serialization and shape checks are plain matches.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Int16(i16),
    Int16Array(Vec<i16>),
    Float(f32),
    FloatArray(Vec<f32>),
    /// Rows of equal length; the row index is the first (fastest) C3D dimension.
    Float2D(Vec<Vec<f32>>),
    String(String),
    StringArray(Vec<String>),
    Byte(u8),
    ByteArray(Vec<u8>),
}

impl ParameterValue {
    pub fn type_code(&self) -> i8 {
        match self {
            ParameterValue::Int16(_) | ParameterValue::Int16Array(_) => TYPE_INT16,
            ParameterValue::Float(_) | ParameterValue::FloatArray(_) | ParameterValue::Float2D(_) => TYPE_FLOAT,
            ParameterValue::String(_) | ParameterValue::StringArray(_) => TYPE_CHAR,
            ParameterValue::Byte(_) | ParameterValue::ByteArray(_) => TYPE_BYTE,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ParameterValue::Int16(_) => "int16",
            ParameterValue::Int16Array(_) => "int16[]",
            ParameterValue::Float(_) => "float",
            ParameterValue::FloatArray(_) => "float[]",
            ParameterValue::Float2D(_) => "float[][]",
            ParameterValue::String(_) => "string",
            ParameterValue::StringArray(_) => "string[]",
            ParameterValue::Byte(_) => "byte",
            ParameterValue::ByteArray(_) => "byte[]",
        }
    }

    /// C3D dimensions, first dimension varying fastest in the data.
    pub fn dimensions(&self) -> Result<Vec<usize>, C3dError> {
        Ok(match self {
            ParameterValue::Int16(_) | ParameterValue::Float(_) | ParameterValue::Byte(_) => Vec::new(),
            ParameterValue::Int16Array(v) => vec![v.len()],
            ParameterValue::FloatArray(v) => vec![v.len()],
            ParameterValue::ByteArray(v) => vec![v.len()],
            ParameterValue::String(s) => vec![s.len()],
            ParameterValue::StringArray(v) => {
                if v.is_empty() {
                    vec![0, 0]
                } else {
                    let width = v.iter().map(|s| s.len()).max().unwrap_or(0);
                    vec![width, v.len()]
                }
            }
            ParameterValue::Float2D(rows) => {
                let columns = rows.first().map_or(0, |r| r.len());
                if rows.iter().any(|r| r.len() != columns) {
                    return Err(C3dError::BlockSerializationError(
                        "two-dimensional parameter rows must have equal length".into(),
                    ));
                }
                vec![rows.len(), columns]
            }
        })
    }

    /// Type tag and dimensions as printed in shape errors, e.g. `string[][8, 3]`.
    pub fn shape(&self) -> String {
        match self.dimensions() {
            Ok(dims) => format!("{}{:?}", self.kind_name(), dims),
            Err(_) => format!("{}[ragged]", self.kind_name()),
        }
    }

    /// True when both values serialize to the same type and dimensions, which
    /// makes their records the same length.
    pub fn same_shape(&self, other: &ParameterValue) -> bool {
        if self.type_code() != other.type_code() {
            return false;
        }
        match (self.dimensions(), other.dimensions()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn write_data(&self, buffer: &mut Vec<u8>) -> Result<(), C3dError> {
        match self {
            ParameterValue::Int16(v) => buffer.extend_from_slice(&v.to_le_bytes()),
            ParameterValue::Int16Array(v) => {
                for x in v {
                    buffer.extend_from_slice(&x.to_le_bytes());
                }
            }
            ParameterValue::Float(v) => buffer.extend_from_slice(&v.to_le_bytes()),
            ParameterValue::FloatArray(v) => {
                for x in v {
                    buffer.extend_from_slice(&x.to_le_bytes());
                }
            }
            ParameterValue::Float2D(rows) => {
                let columns = rows.first().map_or(0, |r| r.len());
                for column in 0..columns {
                    for row in rows {
                        buffer.extend_from_slice(&row[column].to_le_bytes());
                    }
                }
            }
            ParameterValue::String(s) => buffer.extend_from_slice(s.as_bytes()),
            ParameterValue::StringArray(v) => {
                let width = v.iter().map(|s| s.len()).max().unwrap_or(0);
                for s in v {
                    buffer.extend_from_slice(s.as_bytes());
                    buffer.resize(buffer.len() + width - s.len(), b' ');
                }
            }
            ParameterValue::Byte(v) => buffer.push(*v),
            ParameterValue::ByteArray(v) => buffer.extend_from_slice(v),
        }
        Ok(())
    }

    /// Decodes parameter data stored with the given wire type and dimensions.
    pub fn from_wire(type_code: i8, dims: &[usize], data: &[u8]) -> Result<Self, C3dError> {
        let count: usize = dims.iter().product();
        match type_code {
            TYPE_CHAR => {
                let text = |b: &[u8]| String::from_utf8_lossy(b).trim_end_matches([' ', '\0']).to_string();
                match dims.len() {
                    0 => Ok(ParameterValue::String(text(take(data, 0, 1)?))),
                    1 => Ok(ParameterValue::String(text(take(data, 0, dims[0])?))),
                    _ => {
                        let width = dims[0];
                        let entries: usize = dims[1..].iter().product();
                        let mut strings = Vec::with_capacity(entries);
                        for i in 0..entries {
                            strings.push(text(take(data, i * width, width)?));
                        }
                        Ok(ParameterValue::StringArray(strings))
                    }
                }
            }
            TYPE_BYTE => {
                if dims.is_empty() {
                    Ok(ParameterValue::Byte(take(data, 0, 1)?[0]))
                } else {
                    Ok(ParameterValue::ByteArray(take(data, 0, count)?.to_vec()))
                }
            }
            TYPE_INT16 => {
                let raw = take(data, 0, count * 2)?;
                if dims.is_empty() {
                    Ok(ParameterValue::Int16(LittleEndian::read_i16(raw)))
                } else {
                    let values = raw.chunks_exact(2).map(LittleEndian::read_i16).collect();
                    Ok(ParameterValue::Int16Array(values))
                }
            }
            TYPE_FLOAT => {
                let raw = take(data, 0, count * 4)?;
                let values: Vec<f32> = raw.chunks_exact(4).map(LittleEndian::read_f32).collect();
                match dims.len() {
                    0 => Ok(ParameterValue::Float(LittleEndian::read_f32(raw))),
                    2 => {
                        let (rows, columns) = (dims[0], dims[1]);
                        let mut table = vec![Vec::with_capacity(columns); rows];
                        for column in 0..columns {
                            for (row, cells) in table.iter_mut().enumerate() {
                                cells.push(values[column * rows + row]);
                            }
                        }
                        Ok(ParameterValue::Float2D(table))
                    }
                    _ => Ok(ParameterValue::FloatArray(values)),
                }
            }
            other => Err(C3dError::BlockSerializationError(format!("unknown parameter type code {}", other))),
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            ParameterValue::Int16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            ParameterValue::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i16> for ParameterValue {
    fn from(v: i16) -> Self { ParameterValue::Int16(v) }
}

impl From<Vec<i16>> for ParameterValue {
    fn from(v: Vec<i16>) -> Self { ParameterValue::Int16Array(v) }
}

impl From<&[i16]> for ParameterValue {
    fn from(v: &[i16]) -> Self { ParameterValue::Int16Array(v.to_vec()) }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self { ParameterValue::Float(v) }
}

impl From<Vec<f32>> for ParameterValue {
    fn from(v: Vec<f32>) -> Self { ParameterValue::FloatArray(v) }
}

impl From<&[f32]> for ParameterValue {
    fn from(v: &[f32]) -> Self { ParameterValue::FloatArray(v.to_vec()) }
}

impl From<Vec<Vec<f32>>> for ParameterValue {
    fn from(v: Vec<Vec<f32>>) -> Self { ParameterValue::Float2D(v) }
}

impl From<u8> for ParameterValue {
    fn from(v: u8) -> Self { ParameterValue::Byte(v) }
}

impl From<Vec<u8>> for ParameterValue {
    fn from(v: Vec<u8>) -> Self { ParameterValue::ByteArray(v) }
}

impl From<&[u8]> for ParameterValue {
    fn from(v: &[u8]) -> Self { ParameterValue::ByteArray(v.to_vec()) }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self { ParameterValue::String(v.to_string()) }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self { ParameterValue::String(v) }
}

impl From<Vec<String>> for ParameterValue {
    fn from(v: Vec<String>) -> Self { ParameterValue::StringArray(v) }
}

impl From<Vec<&str>> for ParameterValue {
    fn from(v: Vec<&str>) -> Self { ParameterValue::StringArray(v.into_iter().map(String::from).collect()) }
}

impl From<&[&str]> for ParameterValue {
    fn from(v: &[&str]) -> Self { ParameterValue::StringArray(v.iter().map(|s| s.to_string()).collect()) }
}

/// A named parameter belonging to one group of the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    pub value: ParameterValue,
    /// Arena index of the owning group.
    pub group_index: usize,
    /// Absolute position of the record in the open file, 0 until written.
    pub offset_in_file: u64,
}

impl Parameter {
    pub fn new(name: &str, value: ParameterValue, group_index: usize) -> Self {
        Parameter {
            name: name.to_string(),
            description: String::new(),
            value,
            group_index,
            offset_in_file: 0,
        }
    }

    /// Serializes the parameter record.
    ///
    /// # Structure
    /// - name length (i8) and owning group id (i8, positive)
    /// - name bytes
    /// - offset to the next record (i16, counted from this field)
    /// - type code (i8), dimension count (u8), dimensions (u8 each)
    /// - data, first dimension varying fastest
    /// - description length (u8) and description bytes
    pub fn to_bytes(&self, group_id: i8) -> Result<Vec<u8>, C3dError> {
        if group_id <= 0 {
            return Err(C3dError::BlockSerializationError(format!(
                "parameter {} must reference a positive group id, found {}",
                self.name, group_id
            )));
        }
        let name_len = record_name_len(&self.name)?;
        let description_len = description_len(&self.description)?;
        let dims = self.value.dimensions()?;
        if dims.len() > u8::MAX as usize {
            return Err(C3dError::BlockSerializationError(format!("parameter {} has too many dimensions", self.name)));
        }

        let mut buffer = Vec::with_capacity(self.name.len() + 16);
        buffer.push(name_len as u8);
        buffer.push(group_id as u8);
        buffer.extend_from_slice(self.name.as_bytes());
        let next_pos = buffer.len();
        buffer.extend_from_slice(&[0, 0]);
        buffer.push(self.value.type_code() as u8);
        buffer.push(dims.len() as u8);
        for d in &dims {
            let d = u8::try_from(*d).map_err(|_| {
                C3dError::BlockSerializationError(format!(
                    "parameter {} dimension {} exceeds 255",
                    self.name, d
                ))
            })?;
            buffer.push(d);
        }
        self.value.write_data(&mut buffer)?;
        buffer.push(description_len);
        buffer.extend_from_slice(self.description.as_bytes());

        let next = i16::try_from(buffer.len() - next_pos).map_err(|_| {
            C3dError::BlockSerializationError(format!("parameter {} record exceeds 32767 bytes", self.name))
        })?;
        LittleEndian::write_i16(&mut buffer[next_pos..next_pos + 2], next);
        Ok(buffer)
    }
}

/// A named namespace of parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterGroup {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

impl ParameterGroup {
    pub fn new(name: &str) -> Self {
        ParameterGroup {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Serializes the group record: name length, negative id, name, offset to
    /// the next record, description length and description.
    pub fn to_bytes(&self, group_id: i8) -> Result<Vec<u8>, C3dError> {
        if group_id >= 0 {
            return Err(C3dError::BlockSerializationError(format!(
                "group {} must have a negative id, found {}",
                self.name, group_id
            )));
        }
        let name_len = record_name_len(&self.name)?;
        let description_len = description_len(&self.description)?;

        let mut buffer = Vec::with_capacity(self.name.len() + self.description.len() + 5);
        buffer.push(name_len as u8);
        buffer.push(group_id as u8);
        buffer.extend_from_slice(self.name.as_bytes());
        buffer.extend_from_slice(&(3 + description_len as i16).to_le_bytes());
        buffer.push(description_len);
        buffer.extend_from_slice(self.description.as_bytes());
        Ok(buffer)
    }

    /// The record closing the directory: empty name, id 0, no next record.
    pub fn terminator_bytes() -> [u8; TERMINATOR_LEN as usize] {
        [0; TERMINATOR_LEN as usize]
    }
}

/// Wire id of the group stored at `index` in creation order (-1, -2, ...).
pub fn wire_group_id(index: usize) -> Result<i8, C3dError> {
    if index >= i8::MAX as usize {
        return Err(C3dError::BlockSerializationError(format!(
            "parameter directory is limited to {} groups",
            i8::MAX
        )));
    }
    Ok(-(index as i8) - 1)
}

fn record_name_len(name: &str) -> Result<i8, C3dError> {
    if name.is_empty() || name.len() > i8::MAX as usize {
        return Err(C3dError::BlockSerializationError(format!(
            "name {:?} must be 1 to 127 bytes long",
            name
        )));
    }
    Ok(name.len() as i8)
}

fn description_len(description: &str) -> Result<u8, C3dError> {
    u8::try_from(description.len()).map_err(|_| {
        C3dError::BlockSerializationError(format!("description {:?} exceeds 255 bytes", description))
    })
}

/// A record decoded from the parameter directory.
#[derive(Debug)]
pub enum DirectoryRecord {
    Group { id: i8, group: ParameterGroup },
    Parameter { group_id: i8, parameter: Parameter },
    End,
}

impl DirectoryRecord {
    /// Decodes the record at `offset` of `bytes` and returns it together with
    /// the offset of the following record.
    pub fn from_bytes(bytes: &[u8], offset: usize) -> Result<(Self, usize), C3dError> {
        let head = take(bytes, offset, 2)?;
        let name_len = (head[0] as i8).unsigned_abs() as usize;
        let id = head[1] as i8;
        if name_len == 0 || id == 0 {
            return Ok((DirectoryRecord::End, offset));
        }

        let name = String::from_utf8_lossy(take(bytes, offset + 2, name_len)?).into_owned();
        let next_pos = offset + 2 + name_len;
        let next = LittleEndian::read_i16(take(bytes, next_pos, 2)?);
        let mut pos = next_pos + 2;

        let record = if id < 0 {
            let description = read_description(bytes, &mut pos)?;
            DirectoryRecord::Group {
                id,
                group: ParameterGroup {
                    name,
                    description,
                    parameters: Vec::new(),
                },
            }
        } else {
            let kind = take(bytes, pos, 2)?;
            let type_code = kind[0] as i8;
            let dim_count = kind[1] as usize;
            let dims: Vec<usize> = take(bytes, pos + 2, dim_count)?.iter().map(|d| *d as usize).collect();
            pos += 2 + dim_count;
            let element = type_code.unsigned_abs() as usize;
            let data_len = element * dims.iter().product::<usize>();
            let value = ParameterValue::from_wire(type_code, &dims, take(bytes, pos, data_len)?)?;
            pos += data_len;
            let description = read_description(bytes, &mut pos)?;
            DirectoryRecord::Parameter {
                group_id: id,
                parameter: Parameter {
                    name,
                    description,
                    value,
                    group_index: 0,
                    offset_in_file: offset as u64,
                },
            }
        };

        let following = match usize::try_from(next) {
            Ok(0) => pos,
            Ok(next) => next_pos + next,
            Err(_) => {
                return Err(C3dError::BlockSerializationError(format!(
                    "record at {} points {} bytes backwards",
                    offset, next
                )));
            }
        };
        Ok((record, following))
    }
}

fn read_description(bytes: &[u8], pos: &mut usize) -> Result<String, C3dError> {
    let len = take(bytes, *pos, 1)?[0] as usize;
    let text = String::from_utf8_lossy(take(bytes, *pos + 1, len)?).into_owned();
    *pos += 1 + len;
    Ok(text)
}
