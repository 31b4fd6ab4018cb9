// src/core/commands/command_def.rs

//! The `define_commands!` macro: generates the `Command` enum, the name
//! lookup table used by the parser, and the dispatch to each command struct.

macro_rules! define_commands {
    ( $( ($variant:ident, $ty:ident, $module:ident) ),* $(,)? ) => {
        /// A fully parsed client command.
        #[derive(Debug, Clone)]
        pub enum Command {
            $( $variant($module::$ty), )*
        }

        type ParseFn = fn(&[RespFrame]) -> Result<Command, CaradeError>;

        /// Lowercase command name to argument parser.
        static COMMAND_TABLE: Lazy<HashMap<&'static str, ParseFn>> = Lazy::new(|| {
            let mut table: HashMap<&'static str, ParseFn> = HashMap::new();
            $(
                table.insert(
                    <$module::$ty as Default>::default().name(),
                    |args| Ok(Command::$variant(<$module::$ty as ParseCommand>::parse(args)?)),
                );
            )*
            table
        });

        impl Command {
            /// The lowercase command name.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Command::$variant(cmd) => cmd.name(), )*
                }
            }

            /// The full argument vector, name first, as written to the append log.
            pub fn to_log_args(&self) -> Vec<Bytes> {
                match self {
                    $( Command::$variant(cmd) => cmd.to_log_args(), )*
                }
            }

            /// Whether `name` is a command this server knows.
            pub fn is_known(name: &str) -> bool {
                COMMAND_TABLE.contains_key(name.to_ascii_lowercase().as_str())
            }
        }

        #[async_trait]
        impl CommandExt for Command {
            fn get_flags(&self) -> CommandFlags {
                match self {
                    $( Command::$variant(cmd) => cmd.flags(), )*
                }
            }

            fn get_keys(&self) -> Vec<Bytes> {
                match self {
                    $( Command::$variant(cmd) => CommandSpec::get_keys(cmd), )*
                }
            }

            async fn execute(
                &self,
                ctx: &mut ExecutionContext,
            ) -> Result<(RespValue, WriteOutcome), CaradeError> {
                match self {
                    $( Command::$variant(cmd) => ExecutableCommand::execute(cmd, ctx).await, )*
                }
            }
        }

        impl TryFrom<RespFrame> for Command {
            type Error = CaradeError;

            fn try_from(frame: RespFrame) -> Result<Self, Self::Error> {
                let RespFrame::Array(parts) = frame else {
                    return Err(CaradeError::InvalidRequest(
                        "Protocol error: expected an array of bulk strings".into(),
                    ));
                };
                let Some((name_frame, args)) = parts.split_first() else {
                    return Err(CaradeError::InvalidRequest(
                        "Protocol error: empty command".into(),
                    ));
                };
                let name = helpers::extract_string(name_frame)
                    .map_err(|_| CaradeError::InvalidRequest("Protocol error: invalid command name".into()))?;
                match COMMAND_TABLE.get(name.to_ascii_lowercase().as_str()) {
                    Some(parse) => parse(args),
                    None => Err(CaradeError::UnknownCommand(name)),
                }
            }
        }

        impl From<Command> for RespFrame {
            fn from(cmd: Command) -> Self {
                RespFrame::from_args(cmd.to_log_args())
            }
        }
    };
}
