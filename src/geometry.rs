//! Geometric utility objects.

use crate::num::BFloat;
use std::{
    fmt,
    ops::{Add, Div, Index, IndexMut, Mul, Sub},
};

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(any(test, feature = "for-testing"))]
use approx::{AbsDiffEq, RelativeEq};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

use Dim3::{X, Y, Z};

/// Represents any quantity with three dimensional components.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

impl<'a, T> IntoIterator for &'a In3D<T> {
    type Item = &'a T;
    type IntoIter = ::std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<T> AbsDiffEq for In3D<T>
where
    T: AbsDiffEq,
    T::Epsilon: Copy,
{
    type Epsilon = <T as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        T::abs_diff_eq(&self[X], &other[X], epsilon)
            && T::abs_diff_eq(&self[Y], &other[Y], epsilon)
            && T::abs_diff_eq(&self[Z], &other[Z], epsilon)
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<T> RelativeEq for In3D<T>
where
    T: RelativeEq,
    T::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        T::relative_eq(&self[X], &other[X], epsilon, max_relative)
            && T::relative_eq(&self[Y], &other[Y], epsilon, max_relative)
            && T::relative_eq(&self[Z], &other[Z], epsilon, max_relative)
    }
}

/// A 3D spatial vector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Vec3<F>(In3D<F>);

impl<F: BFloat> Vec3<F> {
    /// Creates a new 3D vector given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D vector by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D vector with all components set to zero.
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Creates a new vector from the first three elements of the given slice.
    pub fn from_slice(components: &[F]) -> Self {
        Self::new(components[0], components[1], components[2])
    }

    /// Constructs a new point from the vector components.
    pub fn to_point3(&self) -> Point3<F> {
        Point3::with_each_component(|dim| self[dim])
    }

    /// Computes the squared length of the vector.
    pub fn squared_length(&self) -> F {
        self[X] * self[X] + self[Y] * self[Y] + self[Z] * self[Z]
    }

    /// Computes the length of the vector.
    pub fn length(&self) -> F {
        self.squared_length().sqrt()
    }

    /// Whether the vector is the zero vector.
    pub fn is_zero(&self) -> bool {
        self.squared_length() == F::zero()
    }

    /// Computes the dot product of the vector with another vector.
    pub fn dot(&self, other: &Self) -> F {
        self[X] * other[X] + self[Y] * other[Y] + self[Z] * other[Z]
    }

    /// Computes the cross product of the vector with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self[Y] * other[Z] - self[Z] * other[Y],
            self[Z] * other[X] - self[X] * other[Z],
            self[X] * other[Y] - self[Y] * other[X],
        )
    }

    /// Normalizes the vector to have unit length.
    pub fn normalize(&mut self) {
        let length = self.length();
        assert!(length != F::zero());
        let inv_length = length.recip();
        self[X] = self[X] * inv_length;
        self[Y] = self[Y] * inv_length;
        self[Z] = self[Z] * inv_length;
    }

    /// Returns a normalized version of the vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }
}

impl<F: BFloat> Index<Dim3> for Vec3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Vec3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<'a, F: BFloat> Add<&'a Vec3<F>> for &'a Vec3<F> {
    type Output = Vec3<F>;
    fn add(self, other: Self) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] + other[dim])
    }
}

impl<F: BFloat> Add<Vec3<F>> for Vec3<F> {
    type Output = Self;
    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<'a, F: BFloat> Sub<&'a Vec3<F>> for &'a Vec3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: Self) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] - other[dim])
    }
}

impl<F: BFloat> Sub<Vec3<F>> for Vec3<F> {
    type Output = Self;
    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl<F: BFloat> Mul<F> for &Vec3<F> {
    type Output = Vec3<F>;
    fn mul(self, factor: F) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] * factor)
    }
}

impl<F: BFloat> Mul<F> for Vec3<F> {
    type Output = Self;
    fn mul(self, factor: F) -> Self::Output {
        &self * factor
    }
}

impl<F: BFloat> Div<F> for &Vec3<F> {
    type Output = Vec3<F>;
    fn div(self, divisor: F) -> Self::Output {
        self * divisor.recip()
    }
}

impl<F: BFloat> Div<F> for Vec3<F> {
    type Output = Self;
    fn div(self, divisor: F) -> Self::Output {
        &self / divisor
    }
}

impl<F: BFloat + fmt::Display> fmt::Display for Vec3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> AbsDiffEq for Vec3<F>
where
    F: BFloat + AbsDiffEq,
    F::Epsilon: Copy,
{
    type Epsilon = <In3D<F> as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        In3D::<F>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        In3D::<F>::abs_diff_eq(&self.0, &other.0, epsilon)
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> RelativeEq for Vec3<F>
where
    F: BFloat + RelativeEq,
    F::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        In3D::<F>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        In3D::<F>::relative_eq(&self.0, &other.0, epsilon, max_relative)
    }
}

/// A 3D spatial coordinate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Point3<F>(In3D<F>);

impl<F: BFloat> Point3<F> {
    /// Creates a new 3D point given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D point by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D point with all components set to zero.
    pub fn origin() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Creates a new point from the first three elements of the given slice.
    pub fn from_slice(components: &[F]) -> Self {
        Self::new(components[0], components[1], components[2])
    }

    /// Constructs a new vector from the point components.
    pub fn to_vec3(&self) -> Vec3<F> {
        Vec3::with_each_component(|dim| self[dim])
    }
}

impl<F: BFloat> Index<Dim3> for Point3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Point3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<'a, F: BFloat> Sub<&'a Self> for &'a Point3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: &Self) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] - other[dim])
    }
}

impl<'a, F: BFloat> Add<&'a Vec3<F>> for &'a Point3<F> {
    type Output = Point3<F>;
    fn add(self, vector: &Vec3<F>) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] + vector[dim])
    }
}

impl<'a, F: BFloat> Sub<&'a Vec3<F>> for &'a Point3<F> {
    type Output = Point3<F>;
    fn sub(self, vector: &Vec3<F>) -> Self::Output {
        Self::Output::with_each_component(|dim| self[dim] - vector[dim])
    }
}

impl<F: BFloat + fmt::Display> fmt::Display for Point3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> AbsDiffEq for Point3<F>
where
    F: BFloat + AbsDiffEq,
    F::Epsilon: Copy,
{
    type Epsilon = <In3D<F> as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        In3D::<F>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        In3D::<F>::abs_diff_eq(&self.0, &other.0, epsilon)
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> RelativeEq for Point3<F>
where
    F: BFloat + RelativeEq,
    F::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        In3D::<F>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        In3D::<F>::relative_eq(&self.0, &other.0, epsilon, max_relative)
    }
}

/// A 3x3 matrix stored as rows.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Mat3<F>(In3D<Vec3<F>>);

impl<F: BFloat> Mat3<F> {
    /// Creates a new 3x3 matrix given the three rows.
    pub fn from_rows(row_x: Vec3<F>, row_y: Vec3<F>, row_z: Vec3<F>) -> Self {
        Self(In3D::new(row_x, row_y, row_z))
    }

    /// Creates a new 3x3 matrix by evaluating the given element
    /// constructor for each pair of row and column dimensions.
    pub fn with_each_element<C>(create_element: C) -> Self
    where
        C: Fn(Dim3, Dim3) -> F,
    {
        Self(In3D::with_each_component(|row| {
            Vec3::with_each_component(|col| create_element(row, col))
        }))
    }

    /// Creates a new identity matrix.
    pub fn identity() -> Self {
        Self::with_each_element(|row, col| if row == col { F::one() } else { F::zero() })
    }

    /// Creates the outer product `a b^T` of the two given vectors.
    pub fn outer(a: &Vec3<F>, b: &Vec3<F>) -> Self {
        Self::with_each_element(|row, col| a[row] * b[col])
    }

    /// Returns a reference to the row for the given dimension.
    pub fn row(&self, dim: Dim3) -> &Vec3<F> {
        &self.0[dim]
    }

    /// Constructs the column vector for the given dimension.
    pub fn column(&self, dim: Dim3) -> Vec3<F> {
        Vec3::with_each_component(|row| self.0[row][dim])
    }

    /// Returns a transposed version of the matrix.
    pub fn transposed(&self) -> Self {
        Self::with_each_element(|row, col| self.0[col][row])
    }

    /// Computes the matrix-vector product with the given vector.
    pub fn mul_vec3(&self, vector: &Vec3<F>) -> Vec3<F> {
        Vec3::with_each_component(|row| self.0[row].dot(vector))
    }
}

impl<'a, F: BFloat> Add<&'a Mat3<F>> for &'a Mat3<F> {
    type Output = Mat3<F>;
    fn add(self, other: Self) -> Self::Output {
        Self::Output::with_each_element(|row, col| self.0[row][col] + other.0[row][col])
    }
}

impl<'a, F: BFloat> Sub<&'a Mat3<F>> for &'a Mat3<F> {
    type Output = Mat3<F>;
    fn sub(self, other: Self) -> Self::Output {
        Self::Output::with_each_element(|row, col| self.0[row][col] - other.0[row][col])
    }
}

impl<'a, F: BFloat> Mul<&'a Mat3<F>> for &'a Mat3<F> {
    type Output = Mat3<F>;
    fn mul(self, other: Self) -> Self::Output {
        Self::Output::with_each_element(|row, col| self.0[row].dot(&other.column(col)))
    }
}

impl<F: BFloat> Mul<F> for &Mat3<F> {
    type Output = Mat3<F>;
    fn mul(self, factor: F) -> Self::Output {
        Self::Output::with_each_element(|row, col| self.0[row][col] * factor)
    }
}

impl<F: BFloat> Div<F> for Mat3<F> {
    type Output = Self;
    fn div(self, divisor: F) -> Self::Output {
        &self * divisor.recip()
    }
}

impl<F: BFloat> Div<F> for &Mat3<F> {
    type Output = Mat3<F>;
    fn div(self, divisor: F) -> Self::Output {
        self * divisor.recip()
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> AbsDiffEq for Mat3<F>
where
    F: BFloat + AbsDiffEq,
    F::Epsilon: Copy,
{
    type Epsilon = <F as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        F::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        Dim3::slice().iter().all(|&row| {
            Vec3::<F>::abs_diff_eq(self.row(row), other.row(row), epsilon)
        })
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> RelativeEq for Mat3<F>
where
    F: BFloat + RelativeEq,
    F::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        F::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        Dim3::slice().iter().all(|&row| {
            Vec3::<F>::relative_eq(self.row(row), other.row(row), epsilon, max_relative)
        })
    }
}
