//! Primitive source text to [`PrimitiveDef`].
//!
//! The parser reads a `yap` character stream rather than a token stream:
//! table rows pack symbols without separators (`0f?:1;`), so header and table
//! need different lexical rules and a shared tokenizer would only get in the way.

use indexmap::IndexMap;
use tracing::{debug, trace};
use udpsynth_common::{
    ColumnRole, ConvertError, Logic, PortDecl, PortDirection, PrimitiveDef, PrimitiveKind, Result,
    Row, SourceLocation, Symbol,
};
use yap::{IntoTokens, Tokens};

/// Name used in errors raised before the primitive name is known.
const UNKNOWN_NAME: &str = "<unknown>";

/// Parses a single `primitive ... endprimitive` definition.
///
/// Comments and whitespace may appear anywhere between tokens and symbols.
/// Anything other than trivia after `endprimitive` is rejected.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedPrimitive`] for structural problems,
/// [`ConvertError::InvalidSymbol`] for bad table cells and
/// [`ConvertError::PortArityMismatch`] when a row's column count disagrees
/// with the port list.
pub fn parse_primitive(text: &str) -> Result<PrimitiveDef> {
    let mut parser = Parser::new(text.into_tokens());
    let def = parser.primitive()?;
    debug!(
        "parsed {} primitive `{}`: {} inputs, {} rows",
        def.kind(),
        def.name(),
        def.inputs().len(),
        def.rows().len()
    );
    Ok(def)
}

/// What the declarations say about one port.
#[derive(Debug, Clone, Copy, Default)]
struct PortInfo {
    direction: Option<PortDirection>,
    reg: bool,
    location: SourceLocation,
}

/// One cell as read from the table, before column roles are known.
/// `symbol` is `None` for text that is not a symbol at all.
#[derive(Debug, Clone)]
struct Cell {
    symbol: Option<Symbol>,
    text: String,
    location: SourceLocation,
}

/// Cursor over the characters of one primitive. `line` and `column` always
/// describe the next character of `toks`.
struct Parser<T> {
    toks: T,
    line: usize,
    column: usize,
    name: String,
}

impl<T: Tokens<Item = char>> Parser<T> {
    fn new(toks: T) -> Self {
        Self {
            toks,
            line: 1,
            column: 1,
            name: UNKNOWN_NAME.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Character level
    // -----------------------------------------------------------------------

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&mut self) -> Option<char> {
        self.toks.peek()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.toks.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes `text` if it comes next. `text` never contains a newline.
    fn eat_str(&mut self, text: &str) -> bool {
        let start = self.toks.location();
        if self.toks.tokens(text.chars()) {
            self.column += text.chars().count();
            true
        } else {
            self.toks.set_location(start);
            false
        }
    }

    fn malformed(&self, location: SourceLocation, details: impl Into<String>) -> ConvertError {
        ConvertError::malformed(self.name.clone(), location, details)
    }

    /// Skips whitespace, `//` and `/* */` comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let start = self.location();
            if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else if self.eat_str("//") {
                self.column += self.toks.skip_while(|c| *c != '\n');
            } else if self.eat_str("/*") {
                while !self.eat_str("*/") {
                    if self.bump().is_none() {
                        return Err(self.malformed(start, "unterminated comment"));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn at_eof(&mut self) -> Result<bool> {
        self.skip_trivia()?;
        Ok(self.peek().is_none())
    }

    /// Consumes `c` after trivia, or fails with `what` in the message.
    fn expect_char(&mut self, c: char, what: &str) -> Result<SourceLocation> {
        self.skip_trivia()?;
        let location = self.location();
        if self.peek() == Some(c) {
            self.bump();
            Ok(location)
        } else {
            Err(self.malformed(location, format!("expected `{c}` {what}")))
        }
    }

    fn eat_char(&mut self, c: char) -> Result<bool> {
        self.skip_trivia()?;
        if self.peek() == Some(c) {
            self.bump();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Takes the identifier at the cursor without advancing `column`.
    fn raw_ident(&mut self) -> Option<String> {
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }
        let ident = self
            .toks
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .as_iter()
            .collect();
        Some(ident)
    }

    /// Reads an identifier after trivia without consuming it.
    fn peek_ident(&mut self) -> Result<Option<String>> {
        self.skip_trivia()?;
        let start = self.toks.location();
        let ident = self.raw_ident();
        self.toks.set_location(start);
        Ok(ident)
    }

    fn ident(&mut self, what: &str) -> Result<(String, SourceLocation)> {
        self.skip_trivia()?;
        let location = self.location();
        match self.raw_ident() {
            Some(ident) => {
                self.column += ident.chars().count();
                Ok((ident, location))
            }
            None => Err(self.malformed(location, format!("expected {what}"))),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> Result<bool> {
        if self.peek_ident()?.as_deref() == Some(keyword) {
            self.ident(keyword)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<SourceLocation> {
        self.skip_trivia()?;
        let location = self.location();
        if self.eat_keyword(keyword)? {
            Ok(location)
        } else {
            Err(self.malformed(location, format!("expected `{keyword}`")))
        }
    }

    /// Reads an initial-value literal: `0`, `1`, `1'b0`, `1'b1`, `1'bx`.
    fn init_value(&mut self) -> Result<Logic> {
        self.skip_trivia()?;
        let location = self.location();
        let text: String = self
            .toks
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '\'')
            .as_iter()
            .collect();
        self.column += text.chars().count();
        let value = match text.to_ascii_lowercase().as_str() {
            "0" | "1'b0" => Some(Logic::Zero),
            "1" | "1'b1" => Some(Logic::One),
            "1'bx" => Some(Logic::X),
            _ => None,
        };
        value.ok_or_else(|| self.malformed(location, format!("invalid initial value `{text}`")))
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    fn primitive(&mut self) -> Result<PrimitiveDef> {
        self.expect_keyword("primitive")?;
        let (name, _) = self.ident("primitive name")?;
        self.name = name;

        let mut ports: IndexMap<String, PortInfo> = IndexMap::new();
        let mut initial: Option<(Logic, SourceLocation)> = None;
        let ansi = self.header(&mut ports, &mut initial)?;

        let table_location = loop {
            self.skip_trivia()?;
            let location = self.location();
            if self.eat_keyword("table")? {
                break location;
            }
            self.declaration(&mut ports, &mut initial, ansi)?;
        };

        let raw_rows = self.table()?;
        self.expect_keyword("endprimitive")?;
        if !self.at_eof()? {
            let location = self.location();
            return Err(self.malformed(location, "unexpected text after `endprimitive`"));
        }

        let port_decls = self.resolve_ports(&ports)?;
        let reg = ports.values().next().is_some_and(|p| p.reg);
        self.build(port_decls, reg, initial, raw_rows, table_location)
    }

    /// Parses `( ... ) ;` and records header ports. Returns true for an
    /// ANSI-style header that carries directions.
    fn header(
        &mut self,
        ports: &mut IndexMap<String, PortInfo>,
        initial: &mut Option<(Logic, SourceLocation)>,
    ) -> Result<bool> {
        self.expect_char('(', "after primitive name")?;
        let mut ansi: Option<bool> = None;
        let mut current: Option<PortDirection> = None;

        loop {
            self.skip_trivia()?;
            let location = self.location();
            let mut reg = false;
            let direction = if self.eat_keyword("output")? {
                reg = self.eat_keyword("reg")?;
                Some(PortDirection::Output)
            } else if self.eat_keyword("input")? {
                Some(PortDirection::Input)
            } else {
                None
            };

            let item_ansi = direction.is_some() || current.is_some();
            match ansi {
                None => ansi = Some(item_ansi),
                Some(a) if a != item_ansi => {
                    return Err(self.malformed(location, "mixed ANSI and non-ANSI port list"));
                }
                _ => {}
            }
            if direction.is_some() {
                current = direction;
            }

            let (name, location) = self.ident("port name")?;
            if ports.contains_key(&name) {
                return Err(self.malformed(location, format!("duplicate port `{name}`")));
            }
            if self.eat_char('=')? {
                if !(reg && current == Some(PortDirection::Output)) {
                    return Err(self.malformed(location, "only an `output reg` port takes a value"));
                }
                *initial = Some((self.init_value()?, location));
            }
            ports.insert(
                name,
                PortInfo {
                    direction: current,
                    reg,
                    location,
                },
            );

            if self.eat_char(',')? {
                continue;
            }
            self.expect_char(')', "to close the port list")?;
            self.expect_char(';', "after the port list")?;
            break;
        }
        Ok(ansi.unwrap_or(false))
    }

    /// Parses one body declaration before `table`.
    fn declaration(
        &mut self,
        ports: &mut IndexMap<String, PortInfo>,
        initial: &mut Option<(Logic, SourceLocation)>,
        ansi: bool,
    ) -> Result<()> {
        let (keyword, location) = self.ident("declaration or `table`")?;
        match keyword.as_str() {
            "output" | "input" => {
                if ansi {
                    return Err(self.malformed(
                        location,
                        "port declarations are not allowed after an ANSI header",
                    ));
                }
                let direction = if keyword == "output" {
                    PortDirection::Output
                } else {
                    PortDirection::Input
                };
                let reg = direction == PortDirection::Output && self.eat_keyword("reg")?;
                loop {
                    let (name, location) = self.ident("port name")?;
                    let info = self.header_port(ports, &name, location)?;
                    if info.direction.is_some() {
                        return Err(self.malformed(location, format!("port `{name}` declared twice")));
                    }
                    info.direction = Some(direction);
                    info.reg |= reg;
                    if !self.eat_char(',')? {
                        break;
                    }
                }
            }
            "reg" => {
                let (name, location) = self.ident("register name")?;
                let info = self.header_port(ports, &name, location)?;
                if info.reg {
                    return Err(self.malformed(location, format!("`reg {name}` declared twice")));
                }
                info.reg = true;
            }
            "initial" => {
                let (name, location) = self.ident("register name")?;
                self.header_port(ports, &name, location)?;
                self.expect_char('=', "in initial statement")?;
                if initial.is_some() {
                    return Err(self.malformed(location, "more than one initial statement"));
                }
                *initial = Some((self.init_value()?, location));
                if ports.get_index_of(&name) != Some(0) {
                    return Err(self.malformed(
                        location,
                        format!("initial statement targets `{name}`, not the output"),
                    ));
                }
            }
            other => {
                return Err(self.malformed(location, format!("unexpected `{other}` before `table`")));
            }
        }
        self.expect_char(';', "after declaration")?;
        Ok(())
    }

    fn header_port<'p>(
        &self,
        ports: &'p mut IndexMap<String, PortInfo>,
        name: &str,
        location: SourceLocation,
    ) -> Result<&'p mut PortInfo> {
        ports
            .get_mut(name)
            .ok_or_else(|| self.malformed(location, format!("`{name}` is not in the port list")))
    }

    /// Checks directions and order: one output, first; at least one input.
    fn resolve_ports(&self, ports: &IndexMap<String, PortInfo>) -> Result<Vec<PortDecl>> {
        let mut decls = Vec::with_capacity(ports.len());
        for (i, (name, info)) in ports.iter().enumerate() {
            let direction = info.direction.ok_or_else(|| {
                self.malformed(info.location, format!("port `{name}` has no direction"))
            })?;
            match (i, direction) {
                (0, PortDirection::Input) => {
                    return Err(self.malformed(info.location, "the first port must be the output"));
                }
                (i, PortDirection::Output) if i > 0 => {
                    return Err(self.malformed(info.location, "a primitive has exactly one output"));
                }
                _ => {}
            }
            if info.reg && direction == PortDirection::Input {
                return Err(self.malformed(info.location, format!("input `{name}` declared reg")));
            }
            decls.push(PortDecl {
                name: name.clone(),
                direction,
            });
        }
        if decls.len() < 2 {
            return Err(self.malformed(SourceLocation::new(1, 1), "a primitive needs at least one input"));
        }
        Ok(decls)
    }

    // -----------------------------------------------------------------------
    // Table
    // -----------------------------------------------------------------------

    /// Reads rows up to and including `endtable`. Each row is its list of
    /// `:`-separated fields.
    fn table(&mut self) -> Result<Vec<(SourceLocation, Vec<Vec<Cell>>)>> {
        let mut rows = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.location();
            if self.eat_keyword("endtable")? {
                return Ok(rows);
            }
            if self.peek().is_none() {
                return Err(self.malformed(start, "unterminated table: missing `endtable`"));
            }
            rows.push((start, self.row_fields(start)?));
        }
    }

    fn row_fields(&mut self, start: SourceLocation) -> Result<Vec<Vec<Cell>>> {
        let mut fields = Vec::new();
        let mut current = Vec::new();
        loop {
            self.skip_trivia()?;
            let location = self.location();
            let Some(c) = self.peek() else {
                return Err(self.malformed(start, "unterminated table: row has no `;`"));
            };
            match c {
                ';' => {
                    self.bump();
                    fields.push(current);
                    return Ok(fields);
                }
                ':' => {
                    self.bump();
                    fields.push(std::mem::take(&mut current));
                }
                '(' => {
                    self.bump();
                    current.push(self.paren_edge(location)?);
                }
                _ if self.peek_ident()?.as_deref() == Some("endtable") => {
                    return Err(self.malformed(start, "unterminated row: missing `;` before `endtable`"));
                }
                _ => {
                    self.bump();
                    let symbol = Symbol::from_char(c);
                    trace!("cell `{}` at {}", c, location);
                    current.push(Cell {
                        symbol,
                        text: c.to_string(),
                        location,
                    });
                }
            }
        }
    }

    /// Reads the rest of a `(vw)` edge after the opening parenthesis.
    fn paren_edge(&mut self, location: SourceLocation) -> Result<Cell> {
        let mut inner = Vec::with_capacity(2);
        loop {
            self.skip_trivia()?;
            match self.bump() {
                Some(')') => break,
                Some(c) => inner.push(c),
                None => return Err(self.malformed(location, "unterminated edge symbol")),
            }
        }
        let symbol = match inner.as_slice() {
            [from, to] => Symbol::from_pair(*from, *to),
            _ => None,
        };
        Ok(Cell {
            symbol,
            text: format!("({})", inner.iter().collect::<String>()),
            location,
        })
    }

    /// Assigns column roles, validates every cell and assembles the definition.
    fn build(
        &self,
        ports: Vec<PortDecl>,
        reg: bool,
        initial: Option<(Logic, SourceLocation)>,
        raw_rows: Vec<(SourceLocation, Vec<Vec<Cell>>)>,
        table_location: SourceLocation,
    ) -> Result<PrimitiveDef> {
        let input_count = ports.len() - 1;
        let Some((_, first)) = raw_rows.first() else {
            return Err(self.malformed(table_location, "empty table"));
        };
        let sequential = first.len() == 3;
        let kind = PrimitiveKind::from_state_column(sequential);
        let expected = input_count + usize::from(sequential) + 1;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (index, (location, fields)) in raw_rows.into_iter().enumerate() {
            let found: usize = fields.iter().map(Vec::len).sum();
            let shape_ok = match fields.as_slice() {
                [inputs, output] => !sequential && inputs.len() == input_count && output.len() == 1,
                [inputs, state, output] => {
                    sequential && inputs.len() == input_count && state.len() == 1 && output.len() == 1
                }
                _ => {
                    return Err(self.malformed(
                        location,
                        format!("row #{index} has {} `:`-separated fields", fields.len()),
                    ));
                }
            };
            if !shape_ok {
                return Err(ConvertError::PortArityMismatch {
                    primitive: self.name.clone(),
                    location,
                    row: index,
                    expected,
                    found,
                });
            }
            rows.push(self.row(index, location, fields, sequential)?);
        }

        match (sequential, reg) {
            (true, false) => {
                return Err(self.malformed(
                    table_location,
                    "table has a state column but the output is not declared `reg`",
                ));
            }
            (false, true) => {
                return Err(self.malformed(
                    table_location,
                    "output declared `reg` but the table has no state column",
                ));
            }
            _ => {}
        }
        if let Some((_, location)) = initial.filter(|_| !sequential) {
            return Err(self.malformed(location, "initial statement on a combinational primitive"));
        }

        Ok(PrimitiveDef::new(
            self.name.clone(),
            ports,
            kind,
            initial.map(|(v, _)| v),
            rows,
        ))
    }

    fn row(
        &self,
        index: usize,
        location: SourceLocation,
        mut fields: Vec<Vec<Cell>>,
        sequential: bool,
    ) -> Result<Row> {
        let output = fields.pop().and_then(|mut f| f.pop());
        let state = if sequential {
            fields.pop().and_then(|mut f| f.pop())
        } else {
            None
        };
        let inputs = fields.pop().unwrap_or_default();

        let check = |cell: &Cell, role: ColumnRole| -> Result<Symbol> {
            match cell.symbol {
                Some(symbol)
                    if symbol.is_valid_in(role, sequential) && (sequential || !symbol.is_edge()) =>
                {
                    Ok(symbol)
                }
                _ => Err(ConvertError::InvalidSymbol {
                    primitive: self.name.clone(),
                    location: cell.location,
                    symbol: cell.text.clone(),
                    role,
                    row: index,
                }),
            }
        };

        let inputs = inputs
            .iter()
            .map(|cell| check(cell, ColumnRole::Input))
            .collect::<Result<Vec<_>>>()?;
        let state = state.map(|cell| check(&cell, ColumnRole::State)).transpose()?;
        let output = match output {
            Some(cell) => check(&cell, ColumnRole::Output)?,
            None => return Err(self.malformed(location, format!("row #{index} has no output"))),
        };

        if inputs.iter().filter(|s| s.is_edge()).count() > 1 {
            return Err(self.malformed(
                location,
                format!("row #{index} has more than one edge symbol"),
            ));
        }

        Ok(Row {
            index,
            inputs,
            state,
            output,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SR_LATCH: &str = r"
        // set/reset latch with falling-edge reset
        primitive srff (q, s, r);
            output q; reg q;
            input s, r;
            table
            // s r : q : q+
               1 0 : ? : 1 ;
               0 f : ? : 0 ;
               1 1 : ? : 0 ;
            endtable
        endprimitive
    ";

    const MUX: &str = r"
        primitive mux (out, control, dataA, dataB);
            output out;
            input control, dataA, dataB;
            table
                0 1 ? : 1 ;
                0 0 ? : 0 ;
                1 ? 1 : 1 ;
                1 ? 0 : 0 ;
                x 0 0 : 0 ;
                x 1 1 : 1 ;
            endtable
        endprimitive
    ";

    #[test]
    fn test_parse_sequential() {
        let def = parse_primitive(SR_LATCH).expect("sr latch parses");
        assert_eq!(def.name(), "srff");
        assert_eq!(def.kind(), PrimitiveKind::Sequential);
        assert_eq!(def.output().name, "q");
        let inputs: Vec<_> = def.inputs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(inputs, ["s", "r"]);
        assert_eq!(def.rows().len(), 3);
        assert_eq!(def.rows()[1].inputs, [Symbol::Zero, Symbol::FallingEdge]);
        assert_eq!(def.rows()[1].state, Some(Symbol::DontCare));
        assert_eq!(def.rows()[2].location.line, 10);
    }

    #[test]
    fn test_parse_combinational() {
        let def = parse_primitive(MUX).expect("mux parses");
        assert_eq!(def.kind(), PrimitiveKind::Combinational);
        assert_eq!(def.rows().len(), 6);
        assert!(def.rows().iter().all(|r| r.state.is_none()));
        assert_eq!(def.rows()[4].inputs[0], Symbol::Unknown);
    }

    #[test]
    fn test_parse_packed_rows_and_comments() {
        let text = "primitive t(q,c,d);output q;reg q;input c,d;initial q=1'b1;\
                    table(01)1:?:1;/* hold */(0?)0:?:-;?*:?:-;endtable endprimitive";
        let def = parse_primitive(text).expect("packed table parses");
        assert_eq!(def.initial(), Some(Logic::One));
        assert_eq!(def.rows()[0].inputs[0], Symbol::RisingEdge);
        assert_eq!(def.rows()[1].inputs[0], Symbol::AnyEdgeFromKnown(Logic::Zero));
        assert_eq!(def.rows()[2].inputs[1], Symbol::AnyEdge);
        assert_eq!(def.rows()[2].output, Symbol::NoChange);
    }

    #[test]
    fn test_parse_ansi_header() {
        let text = r"
            primitive dff (output reg q = 0, input clk, d);
            table
                r 0 : ? : 0 ;
                r 1 : ? : 1 ;
            endtable
            endprimitive
        ";
        let def = parse_primitive(text).expect("ansi header parses");
        assert_eq!(def.initial(), Some(Logic::Zero));
        assert_eq!(def.inputs().len(), 2);
        assert_eq!(def.input_name(1), "d");
    }

    #[rstest]
    #[case::missing_endtable("primitive p(q,a); output q; input a; table 0:1;")]
    #[case::missing_endprimitive("primitive p(q,a); output q; input a; table 0:1; endtable")]
    #[case::row_without_semicolon("primitive p(q,a); output q; input a; table 0:1 endtable endprimitive")]
    #[case::input_first("primitive p(a,q); input a; output q; table 0:1; endtable endprimitive")]
    #[case::two_outputs("primitive p(q,a,b); output q, b; input a; table 0:1; endtable endprimitive")]
    #[case::undeclared("primitive p(q,a,b); output q; input a; table 0 0:1; endtable endprimitive")]
    #[case::unknown_port("primitive p(q,a); output q; input a, z; table 0:1; endtable endprimitive")]
    #[case::seq_without_reg("primitive p(q,a); output q; input a; table 0:?:1; endtable endprimitive")]
    #[case::comb_with_reg("primitive p(q,a); output q; reg q; input a; table 0:1; endtable endprimitive")]
    #[case::two_edges("primitive p(q,a,b); output q; reg q; input a,b; table r f:?:1; endtable endprimitive")]
    #[case::empty_table("primitive p(q,a); output q; input a; table endtable endprimitive")]
    #[case::trailing_text("primitive p(q,a); output q; input a; table 0:1; endtable endprimitive module")]
    #[case::unterminated_comment("primitive p(q,a); /* output q; input a; table 0:1; endtable endprimitive")]
    fn test_malformed(#[case] text: &str) {
        match parse_primitive(text) {
            Err(ConvertError::MalformedPrimitive { .. }) => {}
            other => panic!("expected MalformedPrimitive, got {other:?}"),
        }
    }

    #[rstest]
    #[case::unknown_char("primitive p(q,a); output q; input a; table z:1; endtable endprimitive", "z")]
    #[case::edge_in_comb("primitive p(q,a); output q; input a; table r:1; endtable endprimitive", "r")]
    #[case::nochange_in_comb("primitive p(q,a); output q; input a; table 0:-; endtable endprimitive", "-")]
    #[case::edge_in_state("primitive p(q,a); output q; reg q; input a; table 0:r:1; endtable endprimitive", "r")]
    #[case::binary_output("primitive p(q,a); output q; reg q; input a; table 0:?:b; endtable endprimitive", "b")]
    #[case::no_change_pair("primitive p(q,a); output q; reg q; input a; table (00):?:1; endtable endprimitive", "(00)")]
    fn test_invalid_symbol(#[case] text: &str, #[case] expected: &str) {
        match parse_primitive(text) {
            Err(ConvertError::InvalidSymbol { symbol, .. }) => assert_eq!(symbol, expected),
            other => panic!("expected InvalidSymbol, got {other:?}"),
        }
    }

    #[rstest]
    #[case::too_few("primitive p(q,a,b); output q; input a,b; table 0:1; endtable endprimitive", 3, 2)]
    #[case::too_many("primitive p(q,a); output q; input a; table 0 1:1; endtable endprimitive", 2, 3)]
    #[case::mixed_kinds(
        "primitive p(q,a); output q; reg q; input a; table 0:?:1; 1:0; endtable endprimitive",
        3,
        2
    )]
    fn test_port_arity(#[case] text: &str, #[case] expected: usize, #[case] found: usize) {
        match parse_primitive(text) {
            Err(ConvertError::PortArityMismatch {
                expected: e,
                found: f,
                ..
            }) => {
                assert_eq!(e, expected);
                assert_eq!(f, found);
            }
            other => panic!("expected PortArityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_symbol_reports_row_and_location() {
        let text = "primitive p(q,a,b);\noutput q;\ninput a,b;\ntable\n0 1:1;\n1 q:0;\nendtable\nendprimitive";
        match parse_primitive(text) {
            Err(err @ ConvertError::InvalidSymbol { .. }) => {
                assert_eq!(err.primitive(), "p");
                assert_eq!(err.location(), SourceLocation::new(6, 3));
            }
            other => panic!("expected InvalidSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_locations_track_comments() {
        let text = "primitive p(q,a);\n/* two\nlines */ output q;\ninput a;\ntable\n  // c\n  z:1;\nendtable\nendprimitive";
        match parse_primitive(text) {
            Err(err @ ConvertError::InvalidSymbol { .. }) => {
                assert_eq!(err.location(), SourceLocation::new(7, 3));
            }
            other => panic!("expected InvalidSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_prefix_is_not_a_keyword() {
        let text = "primitive p(q,a); output q; input a; tables 0:1; endtable endprimitive";
        match parse_primitive(text) {
            Err(err @ ConvertError::MalformedPrimitive { .. }) => {
                assert_eq!(err.location(), SourceLocation::new(1, 38));
            }
            other => panic!("expected MalformedPrimitive, got {other:?}"),
        }
    }
}
