use super::{LeakyRelu, Relu, Sigmoid};

/// An element-wise activation function.
#[derive(Debug, Clone, PartialEq)]
pub enum ActFn {
    Relu(Relu),
    LeakyRelu(LeakyRelu),
    Sigmoid(Sigmoid),
    Tanh,
    Linear,
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    pub fn leaky_relu(slope: f32) -> Self {
        Self::LeakyRelu(LeakyRelu::new(slope))
    }

    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn tanh() -> Self {
        Self::Tanh
    }

    pub fn linear() -> Self {
        Self::Linear
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Relu(a) => a.f(x),
            Self::LeakyRelu(a) => a.f(x),
            Self::Sigmoid(a) => a.f(x),
            Self::Tanh => x.tanh(),
            Self::Linear => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clips_negatives() {
        let act = ActFn::relu();
        assert_eq!(act, ActFn::Relu(Relu));
        assert_eq!(act.f(-3.0), 0.0);
        assert_eq!(act.f(2.5), 2.5);
    }

    #[test]
    fn leaky_relu_scales_negatives() {
        let act = ActFn::leaky_relu(0.1);
        assert!((act.f(-2.0) + 0.2).abs() < 1e-6);
        assert_eq!(act.f(2.0), 2.0);
    }

    #[test]
    fn sigmoid_is_centered_at_half_amp() {
        let act = ActFn::sigmoid(2.0);
        assert!((act.f(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tanh_and_linear() {
        assert!((ActFn::tanh().f(0.5) - 0.5f32.tanh()).abs() < 1e-6);
        assert_eq!(ActFn::linear().f(-7.0), -7.0);
    }
}
