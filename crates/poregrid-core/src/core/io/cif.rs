use crate::core::io::traits::FrameworkFile;
use crate::core::models::framework::{Framework, FrameworkAtom};
use crate::core::models::lattice::Lattice;
use crate::core::utils::geometry::GeometryError;
use nalgebra::Vector3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, trace};

const SPACE_GROUP_NAME_TAGS: [&str; 2] = [
    "_symmetry_space_group_name_h-m",
    "_space_group_name_h-m_alt",
];
const SPACE_GROUP_NUMBER_TAGS: [&str; 2] =
    ["_symmetry_int_tables_number", "_space_group_it_number"];

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: CifParseErrorKind },
    #[error("Missing required item: {0}")]
    MissingItem(String),
    #[error("No atom site loop with fractional coordinates found")]
    MissingAtomSites,
    #[error("Unsupported space group '{0}': only P1 structures are accepted")]
    UnsupportedSymmetry(String),
    #[error("Invalid unit cell: {0}")]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Error)]
pub enum CifParseErrorKind {
    #[error("Invalid number for '{tag}' (value: '{value}')")]
    InvalidNumber { tag: String, value: String },
    #[error("Unterminated quoted value")]
    UnterminatedQuote,
    #[error("Unterminated semicolon text field")]
    UnterminatedTextField,
    #[error("Tag '{0}' has no value")]
    DanglingTag(String),
    #[error("Loop has {values} values, not a multiple of its {columns} columns")]
    MalformedLoop { values: usize, columns: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    text: String,
    line: usize,
    quoted: bool,
}

impl Token {
    fn is_tag(&self) -> bool {
        !self.quoted && self.text.starts_with('_')
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        !self.quoted
            && self
                .text
                .as_bytes()
                .get(..keyword.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword.as_bytes()))
    }

    fn is_reserved(&self) -> bool {
        self.is_tag() || self.is_keyword("loop_") || self.is_keyword("data_")
    }

    fn is_unknown(&self) -> bool {
        !self.quoted && (self.text == "?" || self.text == ".")
    }
}

#[derive(Debug, Default)]
struct CifLoop {
    tags: Vec<String>,
    rows: Vec<Vec<Token>>,
}

impl CifLoop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }
}

#[derive(Debug, Default)]
struct CifBlock {
    name: Option<String>,
    items: HashMap<String, Token>,
    loops: Vec<CifLoop>,
}

/// Reader for P1 Crystallographic Information Files.
pub struct CifFile;

impl FrameworkFile for CifFile {
    type Error = CifError;

    fn read_from(reader: &mut impl BufRead) -> Result<Framework, Self::Error> {
        let tokens = tokenize(reader)?;
        let block = parse_block(&tokens)?;
        build_framework(&block)
    }
}

fn tokenize(reader: &mut impl BufRead) -> Result<Vec<Token>, CifError> {
    let mut tokens = Vec::new();
    let mut text_field: Option<(usize, String)> = None;

    for (idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = idx + 1;

        if let Some((start, mut buffer)) = text_field.take() {
            if line.starts_with(';') {
                tokens.push(Token {
                    text: buffer.trim_end().to_string(),
                    line: start,
                    quoted: true,
                });
            } else {
                buffer.push_str(&line);
                buffer.push('\n');
                text_field = Some((start, buffer));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix(';') {
            text_field = Some((line_num, format!("{rest}\n")));
            continue;
        }

        tokenize_line(&line, line_num, &mut tokens)?;
    }

    if let Some((start, _)) = text_field {
        return Err(CifError::Parse {
            line: start,
            kind: CifParseErrorKind::UnterminatedTextField,
        });
    }
    Ok(tokens)
}

fn tokenize_line(line: &str, line_num: usize, tokens: &mut Vec<Token>) -> Result<(), CifError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        if ch == '#' {
            break;
        }

        if ch == '\'' || ch == '"' {
            // A closing quote only counts when followed by whitespace or end of line.
            let close = (i + 1..chars.len()).find(|&j| {
                chars[j] == ch && chars.get(j + 1).is_none_or(|next| next.is_whitespace())
            });
            let Some(j) = close else {
                return Err(CifError::Parse {
                    line: line_num,
                    kind: CifParseErrorKind::UnterminatedQuote,
                });
            };
            tokens.push(Token {
                text: chars[i + 1..j].iter().collect(),
                line: line_num,
                quoted: true,
            });
            i = j + 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(Token {
            text: chars[start..i].iter().collect(),
            line: line_num,
            quoted: false,
        });
    }
    Ok(())
}

fn parse_block(tokens: &[Token]) -> Result<CifBlock, CifError> {
    let mut block = CifBlock::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.is_keyword("data_") {
            if block.name.is_some() {
                debug!("Ignoring additional data block '{}'.", token.text);
                break;
            }
            block.name = Some(token.text["data_".len()..].to_string());
            i += 1;
        } else if token.is_keyword("loop_") {
            i += 1;
            let mut cif_loop = CifLoop::default();
            while i < tokens.len() && tokens[i].is_tag() {
                cif_loop.tags.push(tokens[i].text.to_ascii_lowercase());
                i += 1;
            }
            let mut values = Vec::new();
            while i < tokens.len() && !tokens[i].is_reserved() {
                values.push(tokens[i].clone());
                i += 1;
            }
            let columns = cif_loop.tags.len();
            if columns == 0 || values.len() % columns != 0 {
                return Err(CifError::Parse {
                    line: token.line,
                    kind: CifParseErrorKind::MalformedLoop {
                        values: values.len(),
                        columns,
                    },
                });
            }
            cif_loop.rows = values.chunks(columns).map(<[Token]>::to_vec).collect();
            block.loops.push(cif_loop);
        } else if token.is_tag() {
            let value = tokens
                .get(i + 1)
                .filter(|value| !value.is_reserved())
                .ok_or_else(|| CifError::Parse {
                    line: token.line,
                    kind: CifParseErrorKind::DanglingTag(token.text.clone()),
                })?;
            block
                .items
                .insert(token.text.to_ascii_lowercase(), value.clone());
            i += 2;
        } else {
            trace!("Skipping stray token '{}' on line {}.", token.text, token.line);
            i += 1;
        }
    }
    Ok(block)
}

fn parse_number(token: &Token, tag: &str) -> Result<f64, CifError> {
    // Standard uncertainties are written as a parenthesised suffix, e.g. 10.25(3).
    let numeric = token.text.split('(').next().unwrap_or_default();
    numeric.parse::<f64>().map_err(|_| CifError::Parse {
        line: token.line,
        kind: CifParseErrorKind::InvalidNumber {
            tag: tag.to_string(),
            value: token.text.clone(),
        },
    })
}

fn cell_parameter(block: &CifBlock, tag: &str) -> Result<f64, CifError> {
    let token = block
        .items
        .get(tag)
        .ok_or_else(|| CifError::MissingItem(tag.to_string()))?;
    parse_number(token, tag)
}

fn check_symmetry(block: &CifBlock) -> Result<(), CifError> {
    for tag in SPACE_GROUP_NAME_TAGS {
        if let Some(token) = block.items.get(tag).filter(|t| !t.is_unknown()) {
            let normalized: String = token
                .text
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_uppercase();
            if normalized != "P1" {
                return Err(CifError::UnsupportedSymmetry(token.text.clone()));
            }
        }
    }
    for tag in SPACE_GROUP_NUMBER_TAGS {
        if let Some(token) = block.items.get(tag).filter(|t| !t.is_unknown()) {
            if token.text.trim() != "1" {
                return Err(CifError::UnsupportedSymmetry(token.text.clone()));
            }
        }
    }
    Ok(())
}

fn build_framework(block: &CifBlock) -> Result<Framework, CifError> {
    check_symmetry(block)?;

    let lattice = Lattice::from_parameters(
        cell_parameter(block, "_cell_length_a")?,
        cell_parameter(block, "_cell_length_b")?,
        cell_parameter(block, "_cell_length_c")?,
        cell_parameter(block, "_cell_angle_alpha")?,
        cell_parameter(block, "_cell_angle_beta")?,
        cell_parameter(block, "_cell_angle_gamma")?,
    )?;

    let site_loop = block
        .loops
        .iter()
        .find(|l| l.column("_atom_site_fract_x").is_some())
        .ok_or(CifError::MissingAtomSites)?;

    let fract_columns = ["_atom_site_fract_x", "_atom_site_fract_y", "_atom_site_fract_z"]
        .map(|tag| site_loop.column(tag).map(|col| (tag, col)));
    let [Some(fx), Some(fy), Some(fz)] = fract_columns else {
        return Err(CifError::MissingItem(
            "_atom_site_fract_y/_atom_site_fract_z".to_string(),
        ));
    };

    let type_col = site_loop.column("_atom_site_type_symbol");
    let label_col = site_loop.column("_atom_site_label");
    if type_col.is_none() && label_col.is_none() {
        return Err(CifError::MissingItem(
            "_atom_site_type_symbol or _atom_site_label".to_string(),
        ));
    }

    let mut atoms = Vec::with_capacity(site_loop.rows.len());
    for row in &site_loop.rows {
        let label = type_col
            .map(|col| &row[col])
            .filter(|t| !t.is_unknown())
            .or_else(|| label_col.map(|col| &row[col]))
            .map(|t| t.text.clone())
            .unwrap_or_default();

        let position = Vector3::new(
            parse_number(&row[fx.1], fx.0)?,
            parse_number(&row[fy.1], fy.0)?,
            parse_number(&row[fz.1], fz.0)?,
        );
        atoms.push(FrameworkAtom::new(label, position));
    }

    let name = block.name.clone().unwrap_or_default();
    debug!(
        "Parsed CIF framework '{}' with {} atoms and cell volume {:.3} Å³.",
        name,
        atoms.len(),
        lattice.volume()
    );
    Ok(Framework::new(name, lattice, atoms))
}
