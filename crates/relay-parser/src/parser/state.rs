//! Recursive-descent parser over the scanner.
//!
//! `ParserState` consumes one source file and appends its nodes to a
//! caller-supplied `NodeArena`, so a compilation unit's files share one
//! arena and every `NodeIndex` stays unique across the unit.

use relay_common::Span;
use relay_scanner::{ScannerState, SyntaxKind};
use thiserror::Error;

use super::node::{
    AnnotationSetData, AnonymousHandlerData, AssignData, BinaryData, BlockData, BuiltinType,
    BuiltinTypeData, CallData, Cardinality, CardinalityKind, EnumDeclData, EnumElementData,
    EventDeclData, EventListData, EventSetDeclData, EventsRef, ExpressionStatementData,
    FunctionDeclData, FunctionProtoDeclData, GroupDeclData, HandlerRef, HandlerSlotData, IfData,
    InterfaceDeclData, LiteralData, LiteralValue, MachineDeclData, MachineProtoDeclData,
    MapTypeData, MemberData, NameData, NameRef, NamedTypeData, NewData, NodeArena, NodeData,
    NodeIndex, NodeList, OnAction, OnDeclData, ParameterData, ProgramData, QualifiedNameData,
    RaiseData, ReturnData, SendData, SeqTypeData, StateDeclData, Temperature, TupleTypeData,
    TypeDefDeclData, UnaryData, VariableDeclData, WhileData,
};

/// A syntax error with its location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{file}: syntax error at {span}: {message}")]
pub struct ParseError {
    pub file: String,
    pub span: Span,
    pub message: String,
}

/// Parse one source file into the shared arena, returning the program root.
pub fn parse_source(
    arena: &mut NodeArena,
    file_name: impl Into<String>,
    source: impl Into<String>,
) -> Result<NodeIndex, ParseError> {
    ParserState::new(file_name.into(), source.into()).parse_program(arena)
}

/// Parser over a single source file.
pub struct ParserState {
    file_name: String,
    scanner: ScannerState,
    token: SyntaxKind,
    token_span: Span,
    token_value: String,
    last_end: u32,
}

impl ParserState {
    #[must_use]
    pub fn new(file_name: String, source: String) -> Self {
        let mut scanner = ScannerState::new(source);
        let token = scanner.scan();
        let token_span = scanner.token_span();
        let token_value = scanner.token_value().to_string();
        Self {
            file_name,
            scanner,
            token,
            token_span,
            token_value,
            last_end: 0,
        }
    }

    /// Parse the whole file into a `Program` node.
    pub fn parse_program(mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let mut declarations = NodeList::new();
        while !self.at(SyntaxKind::EndOfFile) {
            declarations.push(self.parse_top_decl(arena)?);
        }
        let span = Span::new(start, self.last_end.max(start));
        Ok(arena.add(
            SyntaxKind::Program,
            span,
            NodeData::Program(ProgramData {
                file_name: self.file_name,
                declarations,
            }),
        ))
    }

    // ===== Token plumbing =====

    fn bump(&mut self) {
        self.last_end = self.token_span.end;
        self.token = self.scanner.scan();
        self.token_span = self.scanner.token_span();
        self.token_value = self.scanner.token_value().to_string();
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.token == kind
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            file: self.file_name.clone(),
            span: self.token_span,
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> Result<Span, ParseError> {
        if self.at(kind) {
            let span = self.token_span;
            self.bump();
            Ok(span)
        } else {
            Err(self.error(format!("expected {kind:?}, found {:?}", self.token)))
        }
    }

    fn expect_identifier(&mut self) -> Result<NameRef, ParseError> {
        if self.at(SyntaxKind::Identifier) {
            let name = NameRef::new(self.token_value.clone(), self.token_span);
            self.bump();
            Ok(name)
        } else {
            Err(self.error(format!("expected identifier, found {:?}", self.token)))
        }
    }

    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        let negative = self.eat(SyntaxKind::MinusToken);
        if !self.at(SyntaxKind::IntegerLiteral) {
            return Err(self.error(format!("expected integer literal, found {:?}", self.token)));
        }
        let value: i64 = self
            .token_value
            .parse()
            .map_err(|_| self.error("integer literal out of range"))?;
        self.bump();
        Ok(if negative { -value } else { value })
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    fn identifier_list(&mut self) -> Result<Vec<NameRef>, ParseError> {
        let mut names = vec![self.expect_identifier()?];
        while self.eat(SyntaxKind::CommaToken) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    // ===== Declarations =====

    fn parse_top_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        match self.token {
            SyntaxKind::OpenBracketToken => self.parse_annotation_set(arena),
            SyntaxKind::EventKeyword => self.parse_event_decl(arena),
            SyntaxKind::EventSetKeyword => self.parse_event_set_decl(arena),
            SyntaxKind::EnumKeyword => self.parse_enum_decl(arena),
            SyntaxKind::TypeKeyword => self.parse_type_def_decl(arena),
            SyntaxKind::InterfaceKeyword => self.parse_interface_decl(arena),
            SyntaxKind::MachineKeyword => self.parse_machine_or_proto(arena),
            SyntaxKind::SpecKeyword => self.parse_spec_decl(arena),
            SyntaxKind::FunKeyword => self.parse_fun_decl(arena),
            SyntaxKind::PrototypeKeyword => self.parse_fun_proto_decl(arena),
            _ => Err(self.error(format!("expected declaration, found {:?}", self.token))),
        }
    }

    fn parse_annotation_set(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::OpenBracketToken)?;
        let mut names = Vec::new();
        if !self.at(SyntaxKind::CloseBracketToken) {
            loop {
                let name = self.expect_identifier()?;
                if self.eat(SyntaxKind::EqualsToken) {
                    // Annotation values are parsed and discarded; the binder
                    // rejects the whole set before anyone could use them.
                    self.parse_annotation_value()?;
                }
                names.push(name);
                if !self.eat(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::CloseBracketToken)?;
        Ok(arena.add(
            SyntaxKind::AnnotationSet,
            self.span_from(start),
            NodeData::AnnotationSet(AnnotationSetData { names }),
        ))
    }

    fn parse_annotation_value(&mut self) -> Result<(), ParseError> {
        match self.token {
            SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::Identifier => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error(format!("expected annotation value, found {:?}", self.token))),
        }
    }

    fn parse_cardinality(&mut self) -> Result<Option<Cardinality>, ParseError> {
        let kind = match self.token {
            SyntaxKind::AssumeKeyword => CardinalityKind::Assume,
            SyntaxKind::AssertKeyword => CardinalityKind::Assert,
            _ => return Ok(None),
        };
        self.bump();
        let bound = self.expect_integer()?;
        Ok(Some(Cardinality { kind, bound }))
    }

    fn parse_event_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::EventKeyword)?;
        let name = self.expect_identifier()?;
        let cardinality = self.parse_cardinality()?;
        let payload_type = if self.eat(SyntaxKind::ColonToken) {
            Some(self.parse_type_expr(arena)?)
        } else {
            None
        };
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            SyntaxKind::EventDeclaration,
            self.span_from(start),
            NodeData::EventDecl(EventDeclData {
                name,
                cardinality,
                payload_type,
            }),
        ))
    }

    fn parse_event_set_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::EventSetKeyword)?;
        let name = self.expect_identifier()?;
        self.expect(SyntaxKind::EqualsToken)?;
        self.expect(SyntaxKind::OpenBraceToken)?;
        let events = if self.at(SyntaxKind::CloseBraceToken) {
            Vec::new()
        } else {
            self.identifier_list()?
        };
        self.expect(SyntaxKind::CloseBraceToken)?;
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            SyntaxKind::EventSetDeclaration,
            self.span_from(start),
            NodeData::EventSetDecl(EventSetDeclData { name, events }),
        ))
    }

    fn parse_enum_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::EnumKeyword)?;
        let name = self.expect_identifier()?;
        self.expect(SyntaxKind::OpenBraceToken)?;
        let mut elements = NodeList::new();
        loop {
            let elem_start = self.token_span.start;
            let elem_name = self.expect_identifier()?;
            let value = if self.eat(SyntaxKind::EqualsToken) {
                Some(self.expect_integer()?)
            } else {
                None
            };
            elements.push(arena.add(
                SyntaxKind::EnumElement,
                self.span_from(elem_start),
                NodeData::EnumElement(EnumElementData {
                    name: elem_name,
                    value,
                }),
            ));
            if !self.eat(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(arena.add(
            SyntaxKind::EnumDeclaration,
            self.span_from(start),
            NodeData::EnumDecl(EnumDeclData { name, elements }),
        ))
    }

    fn parse_type_def_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::TypeKeyword)?;
        let name = self.expect_identifier()?;
        let ty = if self.eat(SyntaxKind::EqualsToken) {
            Some(self.parse_type_expr(arena)?)
        } else {
            // `type T;` declares a foreign type.
            None
        };
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            SyntaxKind::TypeDefDeclaration,
            self.span_from(start),
            NodeData::TypeDefDecl(TypeDefDeclData { name, ty }),
        ))
    }

    fn parse_interface_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::InterfaceKeyword)?;
        let name = self.expect_identifier()?;
        let payload_type = if self.eat(SyntaxKind::OpenParenToken) {
            let ty = self.parse_type_expr(arena)?;
            self.expect(SyntaxKind::CloseParenToken)?;
            Some(ty)
        } else {
            None
        };
        self.expect(SyntaxKind::EqualsToken)?;
        let events = if self.eat(SyntaxKind::OpenBraceToken) {
            let events = if self.at(SyntaxKind::CloseBraceToken) {
                Vec::new()
            } else {
                self.identifier_list()?
            };
            self.expect(SyntaxKind::CloseBraceToken)?;
            EventsRef::Literal(events)
        } else {
            EventsRef::Named(self.expect_identifier()?)
        };
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            SyntaxKind::InterfaceDeclaration,
            self.span_from(start),
            NodeData::InterfaceDecl(InterfaceDeclData {
                name,
                payload_type,
                events,
            }),
        ))
    }

    fn parse_machine_or_proto(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::MachineKeyword)?;
        let name = self.expect_identifier()?;

        // A `;` (optionally after a parenthesized payload type) instead of a
        // body makes this a machine prototype.
        if self.at(SyntaxKind::OpenParenToken) || self.at(SyntaxKind::SemicolonToken) {
            let payload_type = if self.eat(SyntaxKind::OpenParenToken) {
                let ty = self.parse_type_expr(arena)?;
                self.expect(SyntaxKind::CloseParenToken)?;
                Some(ty)
            } else {
                None
            };
            self.expect(SyntaxKind::SemicolonToken)?;
            return Ok(arena.add(
                SyntaxKind::MachineProtoDeclaration,
                self.span_from(start),
                NodeData::MachineProtoDecl(MachineProtoDeclData { name, payload_type }),
            ));
        }

        let cardinality = self.parse_cardinality()?;
        let interfaces = if self.eat(SyntaxKind::ColonToken) {
            self.identifier_list()?
        } else {
            Vec::new()
        };
        let items = self.parse_machine_body(arena)?;
        Ok(arena.add(
            SyntaxKind::MachineDeclaration,
            self.span_from(start),
            NodeData::MachineDecl(MachineDeclData {
                name,
                is_spec: false,
                cardinality,
                interfaces,
                observes: Vec::new(),
                items,
            }),
        ))
    }

    fn parse_spec_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::SpecKeyword)?;
        let name = self.expect_identifier()?;
        self.expect(SyntaxKind::ObservesKeyword)?;
        let observes = self.identifier_list()?;
        let items = self.parse_machine_body(arena)?;
        Ok(arena.add(
            SyntaxKind::SpecDeclaration,
            self.span_from(start),
            NodeData::MachineDecl(MachineDeclData {
                name,
                is_spec: true,
                cardinality: None,
                interfaces: Vec::new(),
                observes,
                items,
            }),
        ))
    }

    fn parse_machine_body(&mut self, arena: &mut NodeArena) -> Result<NodeList, ParseError> {
        self.expect(SyntaxKind::OpenBraceToken)?;
        let mut items = NodeList::new();
        while !self.at(SyntaxKind::CloseBraceToken) {
            match self.token {
                SyntaxKind::OpenBracketToken => items.push(self.parse_annotation_set(arena)?),
                SyntaxKind::VarKeyword => self.parse_var_decl(arena, &mut items)?,
                SyntaxKind::FunKeyword => items.push(self.parse_fun_decl(arena)?),
                SyntaxKind::GroupKeyword => items.push(self.parse_group_decl(arena)?),
                SyntaxKind::StartKeyword
                | SyntaxKind::HotKeyword
                | SyntaxKind::ColdKeyword
                | SyntaxKind::StateKeyword => items.push(self.parse_state_decl(arena)?),
                SyntaxKind::ReceivesKeyword => {
                    items.push(self.parse_event_list_decl(
                        arena,
                        SyntaxKind::ReceivesKeyword,
                        SyntaxKind::ReceivesDeclaration,
                    )?);
                }
                SyntaxKind::SendsKeyword => {
                    items.push(self.parse_event_list_decl(
                        arena,
                        SyntaxKind::SendsKeyword,
                        SyntaxKind::SendsDeclaration,
                    )?);
                }
                _ => {
                    return Err(
                        self.error(format!("expected machine item, found {:?}", self.token))
                    );
                }
            }
        }
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(items)
    }

    fn parse_event_list_decl(
        &mut self,
        arena: &mut NodeArena,
        keyword: SyntaxKind,
        node_kind: SyntaxKind,
    ) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(keyword)?;
        let events = self.identifier_list()?;
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            node_kind,
            self.span_from(start),
            NodeData::EventList(EventListData { events }),
        ))
    }

    fn parse_var_decl(
        &mut self,
        arena: &mut NodeArena,
        out: &mut NodeList,
    ) -> Result<(), ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::VarKeyword)?;
        let names = self.identifier_list()?;
        self.expect(SyntaxKind::ColonToken)?;
        let ty = self.parse_type_expr(arena)?;
        self.expect(SyntaxKind::SemicolonToken)?;
        let span = self.span_from(start);
        // One node per declared name keeps the node-to-declaration map
        // injective when `var a, b: t;` declares several variables.
        for name in names {
            out.push(arena.add(
                SyntaxKind::VariableDeclaration,
                name.span.merge(span),
                NodeData::VariableDecl(VariableDeclData { name, ty }),
            ));
        }
        Ok(())
    }

    fn parse_parameters(&mut self, arena: &mut NodeArena) -> Result<NodeList, ParseError> {
        self.expect(SyntaxKind::OpenParenToken)?;
        let mut parameters = NodeList::new();
        if !self.at(SyntaxKind::CloseParenToken) {
            loop {
                let start = self.token_span.start;
                let name = self.expect_identifier()?;
                self.expect(SyntaxKind::ColonToken)?;
                let ty = self.parse_type_expr(arena)?;
                parameters.push(arena.add(
                    SyntaxKind::Parameter,
                    self.span_from(start),
                    NodeData::Parameter(ParameterData { name, ty }),
                ));
                if !self.eat(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::CloseParenToken)?;
        Ok(parameters)
    }

    fn parse_fun_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::FunKeyword)?;
        let name = self.expect_identifier()?;
        let parameters = self.parse_parameters(arena)?;
        let return_type = if self.eat(SyntaxKind::ColonToken) {
            Some(self.parse_type_expr(arena)?)
        } else {
            None
        };
        let body = if self.at(SyntaxKind::OpenBraceToken) {
            Some(self.parse_block(arena)?)
        } else {
            // `fun f(...);` declares a foreign function.
            self.expect(SyntaxKind::SemicolonToken)?;
            None
        };
        Ok(arena.add(
            SyntaxKind::FunctionDeclaration,
            self.span_from(start),
            NodeData::FunctionDecl(FunctionDeclData {
                name,
                parameters,
                return_type,
                body,
            }),
        ))
    }

    fn parse_fun_proto_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::PrototypeKeyword)?;
        let name = self.expect_identifier()?;
        let parameters = self.parse_parameters(arena)?;
        let return_type = if self.eat(SyntaxKind::ColonToken) {
            Some(self.parse_type_expr(arena)?)
        } else {
            None
        };
        let creates = if self.eat(SyntaxKind::CreatesKeyword) {
            self.identifier_list()?
        } else {
            Vec::new()
        };
        self.expect(SyntaxKind::SemicolonToken)?;
        Ok(arena.add(
            SyntaxKind::FunctionProtoDeclaration,
            self.span_from(start),
            NodeData::FunctionProtoDecl(FunctionProtoDeclData {
                name,
                parameters,
                return_type,
                creates,
            }),
        ))
    }

    fn parse_group_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::GroupKeyword)?;
        let name = self.expect_identifier()?;
        self.expect(SyntaxKind::OpenBraceToken)?;
        let mut items = NodeList::new();
        while !self.at(SyntaxKind::CloseBraceToken) {
            match self.token {
                SyntaxKind::GroupKeyword => items.push(self.parse_group_decl(arena)?),
                SyntaxKind::StartKeyword
                | SyntaxKind::HotKeyword
                | SyntaxKind::ColdKeyword
                | SyntaxKind::StateKeyword => items.push(self.parse_state_decl(arena)?),
                _ => {
                    return Err(
                        self.error(format!("expected state or group, found {:?}", self.token))
                    );
                }
            }
        }
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(arena.add(
            SyntaxKind::GroupDeclaration,
            self.span_from(start),
            NodeData::GroupDecl(GroupDeclData { name, items }),
        ))
    }

    fn parse_state_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let mut is_start = false;
        let mut temperature = Temperature::Warm;
        loop {
            match self.token {
                SyntaxKind::StartKeyword => {
                    is_start = true;
                    self.bump();
                }
                SyntaxKind::HotKeyword => {
                    temperature = Temperature::Hot;
                    self.bump();
                }
                SyntaxKind::ColdKeyword => {
                    temperature = Temperature::Cold;
                    self.bump();
                }
                _ => break,
            }
        }
        self.expect(SyntaxKind::StateKeyword)?;
        let name = self.expect_identifier()?;
        self.expect(SyntaxKind::OpenBraceToken)?;
        let mut items = NodeList::new();
        while !self.at(SyntaxKind::CloseBraceToken) {
            items.push(self.parse_state_item(arena)?);
        }
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(arena.add(
            SyntaxKind::StateDeclaration,
            self.span_from(start),
            NodeData::StateDecl(StateDeclData {
                name,
                is_start,
                temperature,
                items,
            }),
        ))
    }

    fn parse_state_item(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        match self.token {
            SyntaxKind::EntryKeyword => {
                self.parse_handler_slot(arena, SyntaxKind::EntryKeyword, SyntaxKind::EntryDeclaration)
            }
            SyntaxKind::ExitKeyword => {
                self.parse_handler_slot(arena, SyntaxKind::ExitKeyword, SyntaxKind::ExitDeclaration)
            }
            SyntaxKind::DeferKeyword => self.parse_event_list_decl(
                arena,
                SyntaxKind::DeferKeyword,
                SyntaxKind::DeferDeclaration,
            ),
            SyntaxKind::IgnoreKeyword => self.parse_event_list_decl(
                arena,
                SyntaxKind::IgnoreKeyword,
                SyntaxKind::IgnoreDeclaration,
            ),
            SyntaxKind::OnKeyword => self.parse_on_decl(arena),
            _ => Err(self.error(format!("expected state item, found {:?}", self.token))),
        }
    }

    fn parse_handler_slot(
        &mut self,
        arena: &mut NodeArena,
        keyword: SyntaxKind,
        node_kind: SyntaxKind,
    ) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(keyword)?;
        let handler = self.parse_handler_ref(arena)?;
        Ok(arena.add(
            node_kind,
            self.span_from(start),
            NodeData::HandlerSlot(HandlerSlotData { handler }),
        ))
    }

    /// `iden ;` names a function; a braced block is an inline handler.
    fn parse_handler_ref(&mut self, arena: &mut NodeArena) -> Result<HandlerRef, ParseError> {
        if self.at(SyntaxKind::OpenBraceToken) {
            let start = self.token_span.start;
            let body = self.parse_block(arena)?;
            let span = self.span_from(start);
            let handler = arena.add(
                SyntaxKind::AnonymousHandler,
                span,
                NodeData::AnonymousHandler(AnonymousHandlerData { body }),
            );
            Ok(HandlerRef::Anonymous(handler))
        } else {
            let name = self.expect_identifier()?;
            self.expect(SyntaxKind::SemicolonToken)?;
            Ok(HandlerRef::Named(name))
        }
    }

    fn parse_on_decl(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::OnKeyword)?;
        let events = self.identifier_list()?;
        let action = match self.token {
            SyntaxKind::DoKeyword => {
                self.bump();
                OnAction::Do(self.parse_handler_ref(arena)?)
            }
            SyntaxKind::GotoKeyword => {
                self.bump();
                let target = self.parse_qualified_name(arena)?;
                if self.eat(SyntaxKind::WithKeyword) {
                    OnAction::Goto {
                        target,
                        with: Some(self.parse_handler_ref(arena)?),
                    }
                } else {
                    self.expect(SyntaxKind::SemicolonToken)?;
                    OnAction::Goto { target, with: None }
                }
            }
            SyntaxKind::PushKeyword => {
                self.bump();
                let target = self.parse_qualified_name(arena)?;
                self.expect(SyntaxKind::SemicolonToken)?;
                OnAction::Push { target }
            }
            _ => {
                return Err(self.error(format!(
                    "expected `do`, `goto`, or `push`, found {:?}",
                    self.token
                )));
            }
        };
        Ok(arena.add(
            SyntaxKind::OnDeclaration,
            self.span_from(start),
            NodeData::OnDecl(OnDeclData { events, action }),
        ))
    }

    fn parse_qualified_name(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let mut parts = vec![self.expect_identifier()?];
        while self.eat(SyntaxKind::DotToken) {
            parts.push(self.expect_identifier()?);
        }
        Ok(arena.add(
            SyntaxKind::QualifiedName,
            self.span_from(start),
            NodeData::QualifiedName(QualifiedNameData { parts }),
        ))
    }

    // ===== Types =====

    fn parse_type_expr(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let builtin = match self.token {
            SyntaxKind::NullKeyword => Some(BuiltinType::Null),
            SyntaxKind::BoolKeyword => Some(BuiltinType::Bool),
            SyntaxKind::IntKeyword => Some(BuiltinType::Int),
            SyntaxKind::FloatKeyword => Some(BuiltinType::Float),
            SyntaxKind::StringKeyword => Some(BuiltinType::String),
            SyntaxKind::EventKeyword => Some(BuiltinType::Event),
            SyntaxKind::MachineKeyword => Some(BuiltinType::Machine),
            SyntaxKind::AnyKeyword => Some(BuiltinType::Any),
            _ => None,
        };
        if let Some(builtin) = builtin {
            self.bump();
            return Ok(arena.add(
                SyntaxKind::BuiltinType,
                self.span_from(start),
                NodeData::BuiltinType(BuiltinTypeData { builtin }),
            ));
        }
        match self.token {
            SyntaxKind::SeqKeyword => {
                self.bump();
                self.expect(SyntaxKind::OpenBracketToken)?;
                let element = self.parse_type_expr(arena)?;
                self.expect(SyntaxKind::CloseBracketToken)?;
                Ok(arena.add(
                    SyntaxKind::SeqType,
                    self.span_from(start),
                    NodeData::SeqType(SeqTypeData { element }),
                ))
            }
            SyntaxKind::MapKeyword => {
                self.bump();
                self.expect(SyntaxKind::OpenBracketToken)?;
                let key = self.parse_type_expr(arena)?;
                self.expect(SyntaxKind::CommaToken)?;
                let value = self.parse_type_expr(arena)?;
                self.expect(SyntaxKind::CloseBracketToken)?;
                Ok(arena.add(
                    SyntaxKind::MapType,
                    self.span_from(start),
                    NodeData::MapType(MapTypeData { key, value }),
                ))
            }
            SyntaxKind::OpenParenToken => {
                self.bump();
                let mut elements = NodeList::new();
                elements.push(self.parse_type_expr(arena)?);
                while self.eat(SyntaxKind::CommaToken) {
                    elements.push(self.parse_type_expr(arena)?);
                }
                self.expect(SyntaxKind::CloseParenToken)?;
                Ok(arena.add(
                    SyntaxKind::TupleType,
                    self.span_from(start),
                    NodeData::TupleType(TupleTypeData { elements }),
                ))
            }
            SyntaxKind::Identifier => {
                let name = self.expect_identifier()?;
                Ok(arena.add(
                    SyntaxKind::NamedType,
                    self.span_from(start),
                    NodeData::NamedType(NamedTypeData { name }),
                ))
            }
            _ => Err(self.error(format!("expected type, found {:?}", self.token))),
        }
    }

    // ===== Statements =====

    fn parse_block(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        self.expect(SyntaxKind::OpenBraceToken)?;
        let mut statements = NodeList::new();
        while !self.at(SyntaxKind::CloseBraceToken) {
            self.parse_statement_into(arena, &mut statements)?;
        }
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(arena.add(
            SyntaxKind::Block,
            self.span_from(start),
            NodeData::Block(BlockData { statements }),
        ))
    }

    fn parse_statement_into(
        &mut self,
        arena: &mut NodeArena,
        out: &mut NodeList,
    ) -> Result<(), ParseError> {
        match self.token {
            SyntaxKind::VarKeyword => self.parse_var_decl(arena, out),
            _ => {
                let stmt = self.parse_statement(arena)?;
                out.push(stmt);
                Ok(())
            }
        }
    }

    fn parse_statement(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        match self.token {
            SyntaxKind::OpenBraceToken => self.parse_block(arena),
            SyntaxKind::SemicolonToken => {
                self.bump();
                Ok(arena.add(
                    SyntaxKind::EmptyStatement,
                    self.span_from(start),
                    NodeData::None,
                ))
            }
            SyntaxKind::IfKeyword => {
                self.bump();
                self.expect(SyntaxKind::OpenParenToken)?;
                let condition = self.parse_expr(arena)?;
                self.expect(SyntaxKind::CloseParenToken)?;
                let then_branch = self.parse_statement(arena)?;
                let else_branch = if self.eat(SyntaxKind::ElseKeyword) {
                    Some(self.parse_statement(arena)?)
                } else {
                    None
                };
                Ok(arena.add(
                    SyntaxKind::IfStatement,
                    self.span_from(start),
                    NodeData::If(IfData {
                        condition,
                        then_branch,
                        else_branch,
                    }),
                ))
            }
            SyntaxKind::WhileKeyword => {
                self.bump();
                self.expect(SyntaxKind::OpenParenToken)?;
                let condition = self.parse_expr(arena)?;
                self.expect(SyntaxKind::CloseParenToken)?;
                let body = self.parse_statement(arena)?;
                Ok(arena.add(
                    SyntaxKind::WhileStatement,
                    self.span_from(start),
                    NodeData::While(WhileData { condition, body }),
                ))
            }
            SyntaxKind::ReturnKeyword => {
                self.bump();
                let value = if self.at(SyntaxKind::SemicolonToken) {
                    None
                } else {
                    Some(self.parse_expr(arena)?)
                };
                self.expect(SyntaxKind::SemicolonToken)?;
                Ok(arena.add(
                    SyntaxKind::ReturnStatement,
                    self.span_from(start),
                    NodeData::Return(ReturnData { value }),
                ))
            }
            SyntaxKind::RaiseKeyword => {
                self.bump();
                let event = self.parse_expr(arena)?;
                let payload = if self.eat(SyntaxKind::CommaToken) {
                    Some(self.parse_expr(arena)?)
                } else {
                    None
                };
                self.expect(SyntaxKind::SemicolonToken)?;
                Ok(arena.add(
                    SyntaxKind::RaiseStatement,
                    self.span_from(start),
                    NodeData::Raise(RaiseData { event, payload }),
                ))
            }
            SyntaxKind::SendKeyword => {
                self.bump();
                let target = self.parse_expr(arena)?;
                self.expect(SyntaxKind::CommaToken)?;
                let event = self.parse_expr(arena)?;
                let payload = if self.eat(SyntaxKind::CommaToken) {
                    Some(self.parse_expr(arena)?)
                } else {
                    None
                };
                self.expect(SyntaxKind::SemicolonToken)?;
                Ok(arena.add(
                    SyntaxKind::SendStatement,
                    self.span_from(start),
                    NodeData::Send(SendData {
                        target,
                        event,
                        payload,
                    }),
                ))
            }
            _ => {
                let expr = self.parse_expr(arena)?;
                let stmt = if self.eat(SyntaxKind::EqualsToken) {
                    let value = self.parse_expr(arena)?;
                    arena.add(
                        SyntaxKind::AssignStatement,
                        self.span_from(start),
                        NodeData::Assign(AssignData {
                            target: expr,
                            value,
                        }),
                    )
                } else {
                    arena.add(
                        SyntaxKind::ExpressionStatement,
                        self.span_from(start),
                        NodeData::ExpressionStatement(ExpressionStatementData { expression: expr }),
                    )
                };
                self.expect(SyntaxKind::SemicolonToken)?;
                Ok(stmt)
            }
        }
    }

    // ===== Expressions =====

    fn binary_precedence(kind: SyntaxKind) -> u8 {
        match kind {
            SyntaxKind::BarBarToken => 1,
            SyntaxKind::AmpersandAmpersandToken => 2,
            SyntaxKind::EqualsEqualsToken | SyntaxKind::ExclamationEqualsToken => 3,
            SyntaxKind::LessThanToken
            | SyntaxKind::LessThanEqualsToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::GreaterThanEqualsToken => 4,
            SyntaxKind::PlusToken | SyntaxKind::MinusToken => 5,
            SyntaxKind::AsteriskToken | SyntaxKind::SlashToken => 6,
            _ => 0,
        }
    }

    fn parse_expr(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        self.parse_binary_expr(arena, 1)
    }

    fn parse_binary_expr(
        &mut self,
        arena: &mut NodeArena,
        min_precedence: u8,
    ) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let mut left = self.parse_unary_expr(arena)?;
        loop {
            let precedence = Self::binary_precedence(self.token);
            if precedence == 0 || precedence < min_precedence {
                break;
            }
            let op = self.token;
            self.bump();
            let right = self.parse_binary_expr(arena, precedence + 1)?;
            left = arena.add(
                SyntaxKind::BinaryExpression,
                self.span_from(start),
                NodeData::Binary(BinaryData { op, left, right }),
            );
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        match self.token {
            SyntaxKind::ExclamationToken | SyntaxKind::MinusToken => {
                let op = self.token;
                self.bump();
                let operand = self.parse_unary_expr(arena)?;
                Ok(arena.add(
                    SyntaxKind::UnaryExpression,
                    self.span_from(start),
                    NodeData::Unary(UnaryData { op, operand }),
                ))
            }
            _ => self.parse_postfix_expr(arena),
        }
    }

    fn parse_postfix_expr(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        let mut expr = self.parse_primary_expr(arena)?;
        loop {
            match self.token {
                SyntaxKind::OpenParenToken => {
                    let arguments = self.parse_arguments(arena)?;
                    expr = arena.add(
                        SyntaxKind::CallExpression,
                        self.span_from(start),
                        NodeData::Call(CallData {
                            callee: expr,
                            arguments,
                        }),
                    );
                }
                SyntaxKind::DotToken => {
                    self.bump();
                    let member = self.expect_identifier()?;
                    expr = arena.add(
                        SyntaxKind::MemberExpression,
                        self.span_from(start),
                        NodeData::Member(MemberData {
                            object: expr,
                            member,
                        }),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self, arena: &mut NodeArena) -> Result<NodeList, ParseError> {
        self.expect(SyntaxKind::OpenParenToken)?;
        let mut arguments = NodeList::new();
        if !self.at(SyntaxKind::CloseParenToken) {
            loop {
                arguments.push(self.parse_expr(arena)?);
                if !self.eat(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::CloseParenToken)?;
        Ok(arguments)
    }

    fn parse_primary_expr(&mut self, arena: &mut NodeArena) -> Result<NodeIndex, ParseError> {
        let start = self.token_span.start;
        match self.token {
            SyntaxKind::Identifier => {
                let name = self.expect_identifier()?;
                Ok(arena.add(
                    SyntaxKind::NameExpression,
                    self.span_from(start),
                    NodeData::Name(NameData { name }),
                ))
            }
            SyntaxKind::IntegerLiteral => {
                let value: i64 = self
                    .token_value
                    .parse()
                    .map_err(|_| self.error("integer literal out of range"))?;
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::Int(value)))
            }
            SyntaxKind::FloatLiteral => {
                let value: f64 = self
                    .token_value
                    .parse()
                    .map_err(|_| self.error("malformed float literal"))?;
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::Float(value)))
            }
            SyntaxKind::StringLiteral => {
                let value = self.token_value.clone();
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::String(value)))
            }
            SyntaxKind::TrueKeyword => {
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::Bool(true)))
            }
            SyntaxKind::FalseKeyword => {
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::Bool(false)))
            }
            SyntaxKind::NullKeyword => {
                self.bump();
                Ok(self.literal(arena, start, LiteralValue::Null))
            }
            SyntaxKind::NewKeyword => {
                self.bump();
                let machine = self.expect_identifier()?;
                let arguments = if self.at(SyntaxKind::OpenParenToken) {
                    self.parse_arguments(arena)?
                } else {
                    NodeList::new()
                };
                Ok(arena.add(
                    SyntaxKind::NewExpression,
                    self.span_from(start),
                    NodeData::New(NewData { machine, arguments }),
                ))
            }
            SyntaxKind::OpenParenToken => {
                self.bump();
                let expr = self.parse_expr(arena)?;
                self.expect(SyntaxKind::CloseParenToken)?;
                Ok(expr)
            }
            _ => Err(self.error(format!("expected expression, found {:?}", self.token))),
        }
    }

    fn literal(&self, arena: &mut NodeArena, start: u32, value: LiteralValue) -> NodeIndex {
        arena.add(
            SyntaxKind::LiteralExpression,
            self.span_from(start),
            NodeData::Literal(LiteralData { value }),
        )
    }
}
