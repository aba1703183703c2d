use super::*;

impl Story {
    pub(super) fn call_native(&mut self, function: NativeFunction) -> Result<(), WeftError> {
        let arity = function.arity();
        if self.evaluation_stack.len() < arity {
            return Err(WeftError::new(
                "ENGINE_NATIVE_ARITY",
                format!(
                    "Native function \"{}\" needs {} arguments but the evaluation stack holds {}.",
                    function.name(),
                    arity,
                    self.evaluation_stack.len()
                ),
            ));
        }
        let args = self
            .evaluation_stack
            .split_off(self.evaluation_stack.len() - arity);
        let result = evaluate_native(function, &args)?;
        self.evaluation_stack.push(result);
        Ok(())
    }
}

enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn type_mismatch(function: NativeFunction, args: &[RuntimeValue]) -> WeftError {
    let kinds = args
        .iter()
        .map(RuntimeValue::type_name)
        .collect::<Vec<_>>()
        .join(", ");
    WeftError::new(
        "ENGINE_TYPE_MISMATCH",
        format!(
            "Native function \"{}\" cannot take ({}).",
            function.name(),
            kinds
        ),
    )
}

fn numeric_operands(
    function: NativeFunction,
    left: &RuntimeValue,
    right: &RuntimeValue,
) -> Result<Operands, WeftError> {
    match (left, right) {
        (RuntimeValue::Int(a), RuntimeValue::Int(b)) => Ok(Operands::Ints(*a, *b)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Operands::Floats(a, b)),
            _ => Err(type_mismatch(function, &[left.clone(), right.clone()])),
        },
    }
}

fn values_equal(left: &RuntimeValue, right: &RuntimeValue) -> bool {
    match (left, right) {
        (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
        (RuntimeValue::DivertTarget(a), RuntimeValue::DivertTarget(b)) => a == b,
        (RuntimeValue::Void, RuntimeValue::Void) => true,
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn divide_by_zero(function: NativeFunction) -> WeftError {
    WeftError::new(
        "ENGINE_DIVIDE_BY_ZERO",
        format!("Integer \"{}\" by zero.", function.name()),
    )
}

pub fn evaluate_native(
    function: NativeFunction,
    args: &[RuntimeValue],
) -> Result<RuntimeValue, WeftError> {
    if args.len() != function.arity() {
        return Err(WeftError::new(
            "ENGINE_NATIVE_ARITY",
            format!(
                "Native function \"{}\" takes {} arguments, got {}.",
                function.name(),
                function.arity(),
                args.len()
            ),
        ));
    }

    match function {
        NativeFunction::Negate => match &args[0] {
            RuntimeValue::Int(value) => Ok(RuntimeValue::Int(value.wrapping_neg())),
            RuntimeValue::Float(value) => Ok(RuntimeValue::Float(-value)),
            _ => Err(type_mismatch(function, args)),
        },
        NativeFunction::Not => Ok(RuntimeValue::from(!args[0].is_truthy())),
        NativeFunction::And => Ok(RuntimeValue::from(
            args[0].is_truthy() && args[1].is_truthy(),
        )),
        NativeFunction::Or => Ok(RuntimeValue::from(
            args[0].is_truthy() || args[1].is_truthy(),
        )),
        NativeFunction::Equal => Ok(RuntimeValue::from(values_equal(&args[0], &args[1]))),
        NativeFunction::NotEqual => Ok(RuntimeValue::from(!values_equal(&args[0], &args[1]))),
        NativeFunction::Add
            if matches!(args[0], RuntimeValue::String(_))
                || matches!(args[1], RuntimeValue::String(_)) =>
        {
            Ok(RuntimeValue::String(format!("{}{}", args[0], args[1])))
        }
        _ => {
            let operands = numeric_operands(function, &args[0], &args[1])?;
            arithmetic(function, operands)
        }
    }
}

fn arithmetic(function: NativeFunction, operands: Operands) -> Result<RuntimeValue, WeftError> {
    let value = match operands {
        Operands::Ints(a, b) => match function {
            NativeFunction::Add => RuntimeValue::Int(a.wrapping_add(b)),
            NativeFunction::Subtract => RuntimeValue::Int(a.wrapping_sub(b)),
            NativeFunction::Multiply => RuntimeValue::Int(a.wrapping_mul(b)),
            NativeFunction::Divide if b == 0 => return Err(divide_by_zero(function)),
            NativeFunction::Divide => RuntimeValue::Int(a.wrapping_div(b)),
            NativeFunction::Modulo if b == 0 => return Err(divide_by_zero(function)),
            NativeFunction::Modulo => RuntimeValue::Int(a.wrapping_rem(b)),
            NativeFunction::Greater => RuntimeValue::from(a > b),
            NativeFunction::Less => RuntimeValue::from(a < b),
            NativeFunction::GreaterOrEqual => RuntimeValue::from(a >= b),
            NativeFunction::LessOrEqual => RuntimeValue::from(a <= b),
            NativeFunction::Min => RuntimeValue::Int(a.min(b)),
            NativeFunction::Max => RuntimeValue::Int(a.max(b)),
            _ => return Err(unsupported(function)),
        },
        Operands::Floats(a, b) => match function {
            NativeFunction::Add => RuntimeValue::Float(a + b),
            NativeFunction::Subtract => RuntimeValue::Float(a - b),
            NativeFunction::Multiply => RuntimeValue::Float(a * b),
            NativeFunction::Divide => RuntimeValue::Float(a / b),
            NativeFunction::Modulo => RuntimeValue::Float(a % b),
            NativeFunction::Greater => RuntimeValue::from(a > b),
            NativeFunction::Less => RuntimeValue::from(a < b),
            NativeFunction::GreaterOrEqual => RuntimeValue::from(a >= b),
            NativeFunction::LessOrEqual => RuntimeValue::from(a <= b),
            NativeFunction::Min => RuntimeValue::Float(a.min(b)),
            NativeFunction::Max => RuntimeValue::Float(a.max(b)),
            _ => return Err(unsupported(function)),
        },
    };
    Ok(value)
}

fn unsupported(function: NativeFunction) -> WeftError {
    WeftError::new(
        "ENGINE_NATIVE_UNSUPPORTED",
        format!("Native function \"{}\" has no numeric form.", function.name()),
    )
}
